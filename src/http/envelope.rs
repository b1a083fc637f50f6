//! Centralized error envelope.
//!
//! `ServiceError` responses carry their parts in a response extension; the
//! outermost middleware renders every error — including bare framework
//! rejections — into one JSON shape:
//! `{ timestamp, status, error, message, path }`, plus `details` with
//! `{field, message}` entries for validation failures.

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::error::{FieldError, ServiceError};

const BODY_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ErrorParts {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub details: Option<Vec<FieldError>>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let details = match &self {
            ServiceError::Validation(errors) => Some(errors.clone()),
            _ => None,
        };
        let parts = ErrorParts {
            status: status.as_u16(),
            error: canonical_reason(status),
            message: self.to_string(),
            details,
        };

        let mut response = status.into_response();
        response.extensions_mut().insert(parts);
        response
    }
}

/// Outermost middleware: normalize every error response into the envelope.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let known = response.extensions().get::<ErrorParts>().cloned();
    let parts = match known {
        Some(parts) => parts,
        // not one of ours: a framework rejection (bad JSON, unknown route)
        None => {
            let body = to_bytes(response.into_body(), BODY_LIMIT)
                .await
                .unwrap_or_default();
            let message = String::from_utf8_lossy(&body).trim().to_string();
            ErrorParts {
                status: status.as_u16(),
                error: canonical_reason(status),
                message: if message.is_empty() {
                    canonical_reason(status)
                } else {
                    message
                },
                details: None,
            }
        }
    };

    let mut body = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "status": parts.status,
        "error": parts.error,
        "message": parts.message,
        "path": path,
    });
    if let Some(details) = parts.details {
        body["details"] = json!(details);
    }

    (status, Json(body)).into_response()
}

fn canonical_reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Error").to_string()
}
