use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product supplier. `tax_id` is unique across suppliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub tax_id: String,
    pub name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub active: bool,
}
