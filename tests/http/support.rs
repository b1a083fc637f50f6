//! Shared harness: starts the full router on port 0 and exposes the
//! underlying services for seeding.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use botica::catalog::{CategoryInput, PaymentMethodInput, ProductInput};
use botica::domain::{PaymentMethod, Product, User};
use botica::{AccountService, AppState, CatalogService, MemoryStore, RecordingMailer};

pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    pub state: AppState,
    pub mailer: RecordingMailer,
}

pub async fn start_app() -> TestApp {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let state = AppState::new(store, Arc::new(mailer.clone()));

    let app = botica::router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        state,
        mailer,
    }
}

pub fn seed_product(catalog: &CatalogService, name: &str, price: Decimal, stock: u32) -> Product {
    let category = catalog.ensure_category("Analgesics").unwrap();
    catalog
        .create_product(ProductInput {
            code: format!("C-{name}"),
            name: name.into(),
            description: "box of 20".into(),
            unit_price: price,
            stock,
            image_url: None,
            category_id: category.id,
            supplier_id: None,
        })
        .unwrap()
}

pub fn seed_category(catalog: &CatalogService, name: &str) -> Uuid {
    catalog
        .create_category(CategoryInput {
            name: name.into(),
            description: String::new(),
        })
        .unwrap()
        .id
}

pub fn seed_payment_method(catalog: &CatalogService) -> PaymentMethod {
    catalog
        .create_payment_method(PaymentMethodInput {
            name: "Credit card".into(),
            description: "gateway checkout".into(),
        })
        .unwrap()
}

pub fn seed_user(accounts: &AccountService, email: &str) -> User {
    accounts
        .register(botica::accounts::RegisterInput {
            email: email.into(),
            password: "correct horse".into(),
            first_name: "Ana".into(),
            last_name: "Diaz".into(),
            role: None,
        })
        .unwrap()
}
