//! Order placement and payment-webhook routes.

use rust_decimal_macros::dec;
use serde_json::{json, Value};

use crate::support::{seed_payment_method, seed_product, seed_user, start_app, TestApp};

async fn seeded() -> (TestApp, Value) {
    let app = start_app().await;
    let a = seed_product(&app.state.catalog, "Aspirin", dec!(3.50), 5);
    let b = seed_product(&app.state.catalog, "Paracetamol", dec!(11.00), 10);
    let user = seed_user(&app.state.accounts, "ana@example.com");
    let method = seed_payment_method(&app.state.catalog);

    let ids = json!({
        "a": a.id,
        "b": b.id,
        "user": user.id,
        "method": method.id,
    });
    (app, ids)
}

fn order_body(ids: &Value) -> Value {
    json!({
        "user_id": ids["user"],
        "payment_method_id": ids["method"],
        "items": [
            { "product_id": ids["a"], "quantity": 3 },
            { "product_id": ids["b"], "quantity": 2 },
        ],
    })
}

#[tokio::test]
async fn placing_an_order_snapshots_prices_and_decrements_stock() {
    let (app, ids) = seeded().await;

    let resp = app
        .client
        .post(format!("{}/orders", app.base))
        .header("x-role", "CUSTOMER")
        .json(&order_body(&ids))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let detail: Value = resp.json().await.unwrap();
    // 3 * 3.50 + 2 * 11.00
    assert_eq!(detail["order"]["total"], "32.50");
    assert_eq!(detail["order"]["status"], "CREATED");
    assert_eq!(detail["line_items"].as_array().unwrap().len(), 2);

    let products = app.state.catalog.list_products().unwrap();
    let stock: Vec<u32> = products.iter().map(|p| p.stock).collect();
    assert_eq!(stock, vec![2, 8]);
}

#[tokio::test]
async fn insufficient_stock_is_a_conflict_and_touches_nothing() {
    let (app, ids) = seeded().await;

    let resp = app
        .client
        .post(format!("{}/orders", app.base))
        .header("x-role", "CUSTOMER")
        .json(&json!({
            "user_id": ids["user"],
            "payment_method_id": ids["method"],
            "items": [
                { "product_id": ids["a"], "quantity": 6 },
                { "product_id": ids["b"], "quantity": 2 },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Conflict");
    assert_eq!(body["path"], "/orders");

    // no partial writes
    let products = app.state.catalog.list_products().unwrap();
    let stock: Vec<u32> = products.iter().map(|p| p.stock).collect();
    assert_eq!(stock, vec![5, 10]);
    assert!(app.state.orders.list_orders().unwrap().is_empty());
}

#[tokio::test]
async fn order_placement_requires_a_signed_in_caller() {
    let (app, ids) = seeded().await;

    let resp = app
        .client
        .post(format!("{}/orders", app.base))
        .json(&order_body(&ids))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn order_listing_is_back_office_only() {
    let (app, _) = seeded().await;

    let resp = app
        .client
        .get(format!("{}/orders", app.base))
        .header("x-role", "CUSTOMER")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(format!("{}/orders", app.base))
        .header("x-role", "ADMIN")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn webhook_completes_an_approved_order() {
    let (app, ids) = seeded().await;

    let resp = app
        .client
        .post(format!("{}/orders", app.base))
        .header("x-role", "CUSTOMER")
        .json(&order_body(&ids))
        .send()
        .await
        .unwrap();
    let detail: Value = resp.json().await.unwrap();
    let order_id = detail["order"]["id"].as_str().unwrap().to_string();

    // the webhook is unauthenticated: the gateway calls it directly
    let resp = app
        .client
        .post(format!("{}/payments/webhook", app.base))
        .json(&json!({ "status": "approved", "external_reference": order_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "COMPLETED");
}

#[tokio::test]
async fn webhook_rejection_cancels_and_restocks() {
    let (app, ids) = seeded().await;

    let resp = app
        .client
        .post(format!("{}/orders", app.base))
        .header("x-role", "CUSTOMER")
        .json(&order_body(&ids))
        .send()
        .await
        .unwrap();
    let detail: Value = resp.json().await.unwrap();
    let order_id = detail["order"]["id"].as_str().unwrap().to_string();

    let resp = app
        .client
        .post(format!("{}/payments/webhook", app.base))
        .json(&json!({ "status": "rejected", "external_reference": order_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "CANCELLED");

    let products = app.state.catalog.list_products().unwrap();
    let stock: Vec<u32> = products.iter().map(|p| p.stock).collect();
    assert_eq!(stock, vec![5, 10]);
}

#[tokio::test]
async fn webhook_with_unknown_reference_is_not_found() {
    let (app, _) = seeded().await;

    let resp = app
        .client
        .post(format!("{}/payments/webhook", app.base))
        .json(&json!({
            "status": "approved",
            "external_reference": uuid::Uuid::new_v4().to_string(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
