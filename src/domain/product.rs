use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product. Stock is mutated only by the stock-adjustment
/// operation; soft-disabled via the `active` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub stock: u32,
    pub active: bool,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Option<Uuid>,
}
