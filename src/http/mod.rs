//! HTTP transport: axum router, shared state, and the two global layers
//! (role guard, error envelope).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::accounts::{AccountService, Mailer};
use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::orders::OrderService;
use crate::store::MemoryStore;

pub mod envelope;
pub mod guard;
pub mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(store: MemoryStore, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            accounts: AccountService::new(store, mailer),
        }
    }

    pub fn from_config(config: &AppConfig, store: MemoryStore, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            catalog: CatalogService::with_cache(
                store.clone(),
                config.cache_capacity,
                Duration::from_secs(config.cache_ttl_seconds),
            ),
            orders: OrderService::new(store.clone()),
            accounts: AccountService::new(store, mailer)
                .with_token_ttl(chrono::Duration::hours(config.reset_token_hours)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/products/popular", get(handlers::popular_products))
        .route("/products/export", get(handlers::export_products))
        .route("/products/import", post(handlers::import_products))
        .route(
            "/products/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .patch(handlers::patch_product)
                .delete(handlers::delete_product),
        )
        .route("/products/:id/stock", post(handlers::adjust_stock))
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/suppliers",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/suppliers/:id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
        .route(
            "/payment-methods",
            get(handlers::list_payment_methods).post(handlers::create_payment_method),
        )
        .route(
            "/payment-methods/:id",
            get(handlers::get_payment_method)
                .put(handlers::update_payment_method)
                .delete(handlers::delete_payment_method),
        )
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route("/orders/:id", get(handlers::get_order))
        .route("/payments/webhook", post(handlers::payment_webhook))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route(
            "/auth/password-reset/request",
            post(handlers::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::confirm_password_reset),
        )
        .layer(middleware::from_fn(guard::enforce))
        // envelope is outermost so it sees guard rejections too
        .layer(middleware::from_fn(envelope::error_envelope))
        .with_state(state)
}

/// Bind and serve until the task is cancelled or the listener fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(state)).await
}
