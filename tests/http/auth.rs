//! Registration, login, and the password-reset flow over the wire.

use serde_json::{json, Value};

use crate::support::start_app;

#[tokio::test]
async fn register_then_login() {
    let app = start_app().await;

    let resp = app
        .client
        .post(format!("{}/auth/register", app.base))
        .json(&json!({
            "email": "ana@example.com",
            "password": "correct horse",
            "first_name": "Ana",
            "last_name": "Diaz",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["role"], "CUSTOMER");
    // the hash never leaves the server
    assert!(user.get("password_hash").is_none());

    let resp = app
        .client
        .post(format!("{}/auth/login", app.base))
        .json(&json!({ "email": "ana@example.com", "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(format!("{}/auth/login", app.base))
        .json(&json!({ "email": "ana@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn register_validation_reports_every_bad_field() {
    let app = start_app().await;

    let resp = app
        .client
        .post(format!("{}/auth/register", app.base))
        .json(&json!({
            "email": "nope",
            "password": "short",
            "first_name": "",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn reset_request_responds_identically_for_unknown_emails() {
    let app = start_app().await;

    let resp = app
        .client
        .post(format!("{}/auth/password-reset/request", app.base))
        .json(&json!({ "email": "ghost@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn full_reset_flow_over_http() {
    let app = start_app().await;

    app.client
        .post(format!("{}/auth/register", app.base))
        .json(&json!({
            "email": "ana@example.com",
            "password": "correct horse",
            "first_name": "Ana",
        }))
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .post(format!("{}/auth/password-reset/request", app.base))
        .json(&json!({ "email": "ana@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, token) = app.mailer.sent().pop().unwrap();

    let resp = app
        .client
        .post(format!("{}/auth/password-reset/confirm", app.base))
        .json(&json!({ "token": token, "new_password": "new password 9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // old password dead, new one works
    let resp = app
        .client
        .post(format!("{}/auth/login", app.base))
        .json(&json!({ "email": "ana@example.com", "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .post(format!("{}/auth/login", app.base))
        .json(&json!({ "email": "ana@example.com", "password": "new password 9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // tokens are single-use
    let (_, token) = app.mailer.sent().pop().unwrap();
    let resp = app
        .client
        .post(format!("{}/auth/password-reset/confirm", app.base))
        .json(&json!({ "token": token, "new_password": "another pass 9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
