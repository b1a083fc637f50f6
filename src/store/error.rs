use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    LockPoisoned(&'static str),
    MissingProduct(Uuid),
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::MissingProduct(id) => write!(f, "product {} does not exist", id),
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => write!(
                f,
                "insufficient stock for product {} (requested {}, available {})",
                product_id, requested, available
            ),
        }
    }
}

impl std::error::Error for StoreError {}
