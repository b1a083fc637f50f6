//! CSV export and import routes.

use rust_decimal_macros::dec;
use serde_json::Value;

use crate::support::{seed_product, start_app};

#[tokio::test]
async fn export_streams_csv_as_an_attachment() {
    let app = start_app().await;
    seed_product(&app.state.catalog, "Aspirin", dec!(3.50), 12);

    let resp = app
        .client
        .get(format!("{}/products/export", app.base))
        .header("x-role", "ADMIN")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let content_type = resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(content_type, "text/csv; charset=utf-8");

    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"products-"));
    assert!(disposition.ends_with(".csv\""));

    let body = resp.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Name;Description;Price;Stock;Category;Image URL"
    );
    assert!(lines.next().unwrap().starts_with("Aspirin;"));
}

#[tokio::test]
async fn export_requires_the_admin_role() {
    let app = start_app().await;

    let resp = app
        .client
        .get(format!("{}/products/export", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn import_reports_successes_and_failures() {
    let app = start_app().await;
    let data = "Name;Description;Price;Stock;Category;Image URL\n\
                Aspirin;box;3.50;12;Analgesics;\n\
                Broken;box;not-a-price;5;Analgesics;\n";

    let resp = app
        .client
        .post(format!("{}/products/import", app.base))
        .header("x-role", "ADMIN")
        .body(data)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["imported"].as_array().unwrap().len(), 1);
    assert_eq!(report["failures"].as_array().unwrap().len(), 1);
    assert_eq!(report["failures"][0]["row"], 3);

    let products = app.state.catalog.list_products().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Aspirin");
}

#[tokio::test]
async fn import_with_a_bad_header_is_rejected() {
    let app = start_app().await;

    let resp = app
        .client
        .post(format!("{}/products/import", app.base))
        .header("x-role", "ADMIN")
        .body("Nome;Desc;Preco\na;b;c\n")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["path"], "/products/import");
}
