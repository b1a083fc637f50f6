use std::error::Error;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::store::StoreError;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error type for all service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Bad input (malformed payload, non-positive quantity, bad token).
    InvalidArgument(String),
    /// Field-level validation failures, reported as a list.
    Validation(Vec<FieldError>),
    /// Absent entity.
    NotFound(String),
    /// Business-rule violation (duplicate email, duplicate tax id).
    Conflict(String),
    /// Requested quantity exceeds the product's current stock.
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },
    /// Missing credentials.
    Unauthorized(String),
    /// Caller's role is not in the endpoint's allow-list.
    Forbidden(String),
    /// Unexpected failure (poisoned lock, serialization).
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            ServiceError::Validation(errors) => {
                write!(f, "validation failed on {} field(s)", errors.len())
            }
            ServiceError::NotFound(what) => write!(f, "not found: {}", what),
            ServiceError::Conflict(msg) => write!(f, "conflict: {}", msg),
            ServiceError::InsufficientStock {
                product_id,
                requested,
                available,
            } => write!(
                f,
                "insufficient stock for product {} (requested {}, available {})",
                product_id, requested, available
            ),
            ServiceError::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
            ServiceError::Forbidden(msg) => write!(f, "forbidden: {}", msg),
            ServiceError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockPoisoned(op) => {
                ServiceError::Internal(format!("store lock poisoned during {}", op))
            }
            StoreError::MissingProduct(id) => ServiceError::NotFound(format!("product {}", id)),
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => ServiceError::InsufficientStock {
                product_id,
                requested,
                available,
            },
        }
    }
}

impl ServiceError {
    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::InsufficientStock { .. } => 409,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::Internal(_) => 500,
        }
    }
}
