//! REST handlers. Thin: decode, call the service, encode.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::accounts::RegisterInput;
use crate::catalog::{
    CategoryInput, PaymentMethodInput, ProductInput, ProductPatch, StockDirection, SupplierInput,
};
use crate::error::ServiceError;
use crate::orders::NewOrder;
use crate::payments::PaymentNotification;
use crate::reports;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

// ---------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------

pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.list_products()?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.create_product(input)?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.product_cached(id)?))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.update_product(id, input)?))
}

pub async fn patch_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProductPatch>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.patch_product(id, patch)?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.delete_product(id)?))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub quantity: u32,
    pub direction: StockDirection,
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(adjustment): Json<StockAdjustment>,
) -> Result<impl IntoResponse, ServiceError> {
    let stock = state
        .catalog
        .adjust_stock(id, adjustment.quantity, adjustment.direction)?;
    Ok(Json(json!({ "product_id": id, "stock": stock })))
}

pub async fn popular_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.popular_products(10)?))
}

// ---------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.list_categories()?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.catalog.create_category(input)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.category(id)?))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.update_category(id, input)?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.delete_category(id)?))
}

// ---------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------

pub async fn list_suppliers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.list_suppliers()?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<SupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.catalog.create_supplier(input)?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.supplier(id)?))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.update_supplier(id, input)?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.delete_supplier(id)?))
}

// ---------------------------------------------------------------------
// Payment methods
// ---------------------------------------------------------------------

pub async fn list_payment_methods(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.list_payment_methods()?))
}

pub async fn create_payment_method(
    State(state): State<AppState>,
    Json(input): Json<PaymentMethodInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let method = state.catalog.create_payment_method(input)?;
    Ok((StatusCode::CREATED, Json(method)))
}

pub async fn get_payment_method(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.payment_method(id)?))
}

pub async fn update_payment_method(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PaymentMethodInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.update_payment_method(id, input)?))
}

pub async fn delete_payment_method(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.catalog.delete_payment_method(id)?))
}

// ---------------------------------------------------------------------
// Orders and payments
// ---------------------------------------------------------------------

pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<NewOrder>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.orders.place_order(request)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.orders.list_orders()?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.orders.order(id)?))
}

pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(notification): Json<PaymentNotification>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.orders.apply_payment_notification(&notification)?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------

pub async fn export_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let csv = reports::export_products_csv(&state.catalog)?;
    let filename = reports::attachment_filename(Utc::now());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    ))
}

pub async fn import_products(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, ServiceError> {
    let report = reports::import_products_csv(&state.catalog, &body)?;
    Ok(Json(report))
}

// ---------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.accounts.register(input)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.accounts.authenticate(&input.email, &input.password)?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct ResetRequestInput {
    pub email: String,
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(input): Json<ResetRequestInput>,
) -> Result<impl IntoResponse, ServiceError> {
    state.accounts.request_reset(&input.email)?;
    // identical response whether or not the email exists
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmInput {
    pub token: String,
    pub new_password: String,
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(input): Json<ResetConfirmInput>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .accounts
        .confirm_reset(&input.token, &input.new_password)?;
    Ok(Json(json!({ "ok": true })))
}
