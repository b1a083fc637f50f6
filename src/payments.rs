//! Payment gateway integration: the checkout request builder, the status
//! mapping table for asynchronous webhooks, and the client seam.
//!
//! The gateway echoes `external_reference` back in its status callback;
//! that string is the order id and is how a notification finds its order.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::OrderStatus;
use crate::error::ServiceError;

/// Map an external payment status to an order status.
///
/// approved → Completed; rejected/cancelled/refunded/charged_back →
/// Cancelled; in_process/pending/authorized and anything unrecognized →
/// PendingExternal.
pub fn map_gateway_status(status: &str) -> OrderStatus {
    match status.to_ascii_lowercase().as_str() {
        "approved" => OrderStatus::Completed,
        "rejected" | "cancelled" | "refunded" | "charged_back" => OrderStatus::Cancelled,
        "in_process" | "pending" | "authorized" => OrderStatus::PendingExternal,
        _ => OrderStatus::PendingExternal,
    }
}

/// Asynchronous status callback payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub status: String,
    pub external_reference: String,
}

/// Redirect targets the gateway sends the payer back to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// The checkout preference sent to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub external_reference: String,
    pub payer_email: String,
    pub items: Vec<CheckoutItem>,
    pub back_urls: BackUrls,
}

impl CheckoutRequest {
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum()
    }
}

/// A created gateway session the payer is redirected into.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub preference_id: String,
    pub init_url: String,
}

/// Seam for the external payment collaborator. The real client lives
/// outside this crate; tests use [`RecordingGateway`].
pub trait GatewayClient: Send + Sync {
    fn create_preference(&self, request: &CheckoutRequest) -> Result<CheckoutSession, ServiceError>;
}

/// Test double that records every request and fabricates a session.
#[derive(Clone, Default)]
pub struct RecordingGateway {
    requests: Arc<RwLock<Vec<CheckoutRequest>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl GatewayClient for RecordingGateway {
    fn create_preference(&self, request: &CheckoutRequest) -> Result<CheckoutSession, ServiceError> {
        self.requests
            .write()
            .map_err(|_| ServiceError::Internal("gateway recorder lock poisoned".into()))?
            .push(request.clone());
        Ok(CheckoutSession {
            preference_id: format!("pref-{}", request.external_reference),
            init_url: format!(
                "https://gateway.example/checkout/{}",
                request.external_reference
            ),
        })
    }
}
