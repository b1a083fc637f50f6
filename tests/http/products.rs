//! Product and catalog routes: role enforcement, the error envelope, and
//! CRUD behavior over the wire.

use rust_decimal_macros::dec;
use serde_json::{json, Value};

use crate::support::{seed_category, seed_product, start_app};

#[tokio::test]
async fn health_is_public() {
    let app = start_app().await;
    let resp = app
        .client
        .get(format!("{}/health", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn product_listing_is_public() {
    let app = start_app().await;
    seed_product(&app.state.catalog, "Aspirin", dec!(3.50), 12);

    let resp = app
        .client
        .get(format!("{}/products", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Aspirin");
    // Decimal serializes as a string
    assert_eq!(body[0]["unit_price"], "3.50");
}

#[tokio::test]
async fn create_product_requires_credentials() {
    let app = start_app().await;

    let resp = app
        .client
        .post(format!("{}/products", app.base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 401);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["path"], "/products");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn create_product_rejects_non_admin_roles() {
    let app = start_app().await;

    let resp = app
        .client
        .post(format!("{}/products", app.base))
        .header("x-role", "CUSTOMER")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn admin_creates_and_fetches_a_product() {
    let app = start_app().await;
    let category_id = seed_category(&app.state.catalog, "Vitamins");

    let resp = app
        .client
        .post(format!("{}/products", app.base))
        .header("x-role", "admin") // role match is case-insensitive
        .json(&json!({
            "code": "VIT-C-500",
            "name": "Vitamin C",
            "description": "jar of 60",
            "unit_price": "8.00",
            "stock": 4,
            "category_id": category_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();

    let resp = app
        .client
        .get(format!("{}/products/{}", app.base, created["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched["code"], "VIT-C-500");
    assert_eq!(fetched["stock"], 4);
}

#[tokio::test]
async fn validation_failures_carry_field_details() {
    let app = start_app().await;
    let category_id = seed_category(&app.state.catalog, "Vitamins");

    let resp = app
        .client
        .post(format!("{}/products", app.base))
        .header("x-role", "ADMIN")
        .json(&json!({
            "code": "",
            "name": "",
            "description": "",
            "unit_price": "-1",
            "category_id": category_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    let details = body["details"].as_array().unwrap();
    let fields: Vec<&str> = details
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["code", "name", "unit_price"]);
}

#[tokio::test]
async fn missing_product_renders_the_envelope() {
    let app = start_app().await;
    let id = uuid::Uuid::new_v4();

    let resp = app
        .client
        .get(format!("{}/products/{id}", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], format!("/products/{id}"));
}

#[tokio::test]
async fn stock_adjustment_moves_stock() {
    let app = start_app().await;
    let product = seed_product(&app.state.catalog, "Aspirin", dec!(3.50), 12);

    let resp = app
        .client
        .post(format!("{}/products/{}/stock", app.base, product.id))
        .header("x-role", "ADMIN")
        .json(&json!({ "quantity": 5, "direction": "OUT" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["stock"], 7);
}

#[tokio::test]
async fn delete_is_a_soft_delete() {
    let app = start_app().await;
    let product = seed_product(&app.state.catalog, "Aspirin", dec!(3.50), 12);

    let resp = app
        .client
        .delete(format!("{}/products/{}", app.base, product.id))
        .header("x-role", "ADMIN")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["active"], false);
}

#[tokio::test]
async fn suppliers_are_admin_only_even_for_reads() {
    let app = start_app().await;

    let resp = app
        .client
        .get(format!("{}/suppliers", app.base))
        .header("x-role", "CUSTOMER")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(format!("{}/suppliers", app.base))
        .header("x-role", "ADMIN")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
