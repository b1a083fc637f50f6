//! Catalog management: products, categories, suppliers, payment methods,
//! and the stock-adjustment primitive.
//!
//! Detail reads go through a bounded TTL cache (read-through, never
//! invalidated on write).

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::domain::{Category, PaymentMethod, Product, Supplier};
use crate::error::{FieldError, ServiceError};
use crate::store::MemoryStore;

const DEFAULT_CACHE_CAPACITY: usize = 256;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
const POPULAR_KEY: &str = "popular";

/// Direction flag for the stock-adjustment primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: Uuid,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
}

/// Partial update. Absent fields keep their current value; stock is
/// deliberately not here — it only moves through `adjust_stock`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplierInput {
    pub tax_id: String,
    pub name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone)]
pub struct CatalogService {
    store: MemoryStore,
    product_cache: TtlCache<Uuid, Product>,
    popular_cache: TtlCache<&'static str, Vec<Product>>,
}

impl CatalogService {
    pub fn new(store: MemoryStore) -> Self {
        Self::with_cache(store, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }

    pub fn with_cache(store: MemoryStore, capacity: usize, ttl: Duration) -> Self {
        Self {
            store,
            product_cache: TtlCache::new(capacity, ttl),
            popular_cache: TtlCache::new(1, ttl),
        }
    }

    // -------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------

    pub fn create_product(&self, input: ProductInput) -> Result<Product, ServiceError> {
        validate_product(&input)?;

        if self.store.category(input.category_id)?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "category {}",
                input.category_id
            )));
        }
        if let Some(supplier_id) = input.supplier_id {
            if self.store.supplier(supplier_id)?.is_none() {
                return Err(ServiceError::NotFound(format!("supplier {}", supplier_id)));
            }
        }

        let product = Product {
            id: Uuid::new_v4(),
            code: input.code,
            name: input.name,
            description: input.description,
            unit_price: input.unit_price,
            stock: input.stock,
            active: true,
            image_url: input.image_url,
            category_id: input.category_id,
            supplier_id: input.supplier_id,
        };
        self.store.put_product(product.clone())?;
        tracing::info!(product = %product.id, code = %product.code, "product created");
        Ok(product)
    }

    pub fn product(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.store
            .product(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", id)))
    }

    /// Read-through cached lookup for the storefront detail page.
    pub fn product_cached(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.product_cache
            .get_or_load(id, || self.store.product(id).map_err(ServiceError::from))?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", id)))
    }

    pub fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list_products()?)
    }

    pub fn products_by_category(&self, category_id: Uuid) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.products_by_category(category_id)?)
    }

    /// Full update. Stock and the active flag are preserved; stock moves
    /// only through `adjust_stock`.
    pub fn update_product(&self, id: Uuid, input: ProductInput) -> Result<Product, ServiceError> {
        validate_product(&input)?;
        let mut product = self.product(id)?;

        if self.store.category(input.category_id)?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "category {}",
                input.category_id
            )));
        }

        product.code = input.code;
        product.name = input.name;
        product.description = input.description;
        product.unit_price = input.unit_price;
        product.image_url = input.image_url;
        product.category_id = input.category_id;
        product.supplier_id = input.supplier_id;
        self.store.put_product(product.clone())?;
        Ok(product)
    }

    pub fn patch_product(&self, id: Uuid, patch: ProductPatch) -> Result<Product, ServiceError> {
        let mut product = self.product(id)?;

        if let Some(code) = patch.code {
            product.code = code;
        }
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(unit_price) = patch.unit_price {
            if unit_price <= Decimal::ZERO {
                return Err(ServiceError::Validation(vec![FieldError::new(
                    "unit_price",
                    "must be greater than zero",
                )]));
            }
            product.unit_price = unit_price;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(active) = patch.active {
            product.active = active;
        }
        if let Some(category_id) = patch.category_id {
            if self.store.category(category_id)?.is_none() {
                return Err(ServiceError::NotFound(format!("category {}", category_id)));
            }
            product.category_id = category_id;
        }
        if let Some(supplier_id) = patch.supplier_id {
            if self.store.supplier(supplier_id)?.is_none() {
                return Err(ServiceError::NotFound(format!("supplier {}", supplier_id)));
            }
            product.supplier_id = Some(supplier_id);
        }

        self.store.put_product(product.clone())?;
        Ok(product)
    }

    /// Soft delete: flips the active flag, the row stays.
    pub fn delete_product(&self, id: Uuid) -> Result<Product, ServiceError> {
        let mut product = self.product(id)?;
        product.active = false;
        self.store.put_product(product.clone())?;
        Ok(product)
    }

    /// Stock-adjustment primitive: add (IN) or subtract (OUT) `quantity`.
    ///
    /// Rejects a zero quantity. Does not guard against a negative result —
    /// callers pre-validate; the store floors at zero.
    pub fn adjust_stock(
        &self,
        product_id: Uuid,
        quantity: u32,
        direction: StockDirection,
    ) -> Result<u32, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be positive".into(),
            ));
        }
        let delta = match direction {
            StockDirection::In => quantity as i64,
            StockDirection::Out => -(quantity as i64),
        };
        let stock = self.store.adjust_stock(product_id, delta)?;
        tracing::info!(product = %product_id, %quantity, ?direction, stock, "stock adjusted");
        Ok(stock)
    }

    /// Most-ordered active products, by total quantity across all line
    /// items. Served through a TTL cache.
    pub fn popular_products(&self, limit: usize) -> Result<Vec<Product>, ServiceError> {
        let ranked = self
            .popular_cache
            .get_or_load(POPULAR_KEY, || {
                self.rank_products().map(Some).map_err(ServiceError::from)
            })?
            .unwrap_or_default();
        Ok(ranked.into_iter().take(limit).collect())
    }

    fn rank_products(&self) -> Result<Vec<Product>, ServiceError> {
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for item in self.store.list_line_items()? {
            *counts.entry(item.product_id).or_default() += item.quantity as u64;
        }

        let mut ranked: Vec<(u64, Product)> = Vec::new();
        for (product_id, count) in counts {
            if let Some(product) = self.store.product(product_id)? {
                if product.active {
                    ranked.push((count, product));
                }
            }
        }
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
        Ok(ranked.into_iter().map(|(_, p)| p).collect())
    }

    // -------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------

    pub fn create_category(&self, input: CategoryInput) -> Result<Category, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation(vec![FieldError::new(
                "name",
                "must not be empty",
            )]));
        }
        if self.store.category_by_name(&input.name)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "category '{}' already exists",
                input.name
            )));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            active: true,
            created_at: Utc::now(),
        };
        self.store.put_category(category.clone())?;
        Ok(category)
    }

    pub fn category(&self, id: Uuid) -> Result<Category, ServiceError> {
        self.store
            .category(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("category {}", id)))
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.store.list_categories()?)
    }

    pub fn update_category(&self, id: Uuid, input: CategoryInput) -> Result<Category, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation(vec![FieldError::new(
                "name",
                "must not be empty",
            )]));
        }
        let mut category = self.category(id)?;
        category.name = input.name;
        category.description = input.description;
        self.store.put_category(category.clone())?;
        Ok(category)
    }

    pub fn delete_category(&self, id: Uuid) -> Result<Category, ServiceError> {
        let mut category = self.category(id)?;
        category.active = false;
        self.store.put_category(category.clone())?;
        Ok(category)
    }

    /// Look up a category by name, creating it when unknown. Used by the
    /// spreadsheet import.
    pub fn ensure_category(&self, name: &str) -> Result<Category, ServiceError> {
        if let Some(category) = self.store.category_by_name(name)? {
            return Ok(category);
        }
        self.create_category(CategoryInput {
            name: name.to_string(),
            description: String::new(),
        })
    }

    // -------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------

    pub fn create_supplier(&self, input: SupplierInput) -> Result<Supplier, ServiceError> {
        let mut errors = Vec::new();
        if input.tax_id.trim().is_empty() {
            errors.push(FieldError::new("tax_id", "must not be empty"));
        }
        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        if self.store.supplier_by_tax_id(&input.tax_id)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "supplier with tax id '{}' already exists",
                input.tax_id
            )));
        }

        let supplier = Supplier {
            id: Uuid::new_v4(),
            tax_id: input.tax_id,
            name: input.name,
            contact_email: input.contact_email,
            contact_phone: input.contact_phone,
            active: true,
        };
        self.store.put_supplier(supplier.clone())?;
        Ok(supplier)
    }

    pub fn supplier(&self, id: Uuid) -> Result<Supplier, ServiceError> {
        self.store
            .supplier(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {}", id)))
    }

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>, ServiceError> {
        Ok(self.store.list_suppliers()?)
    }

    pub fn update_supplier(&self, id: Uuid, input: SupplierInput) -> Result<Supplier, ServiceError> {
        let mut supplier = self.supplier(id)?;

        // the unique key may move to another value, but not onto a taken one
        if let Some(existing) = self.store.supplier_by_tax_id(&input.tax_id)? {
            if existing.id != id {
                return Err(ServiceError::Conflict(format!(
                    "supplier with tax id '{}' already exists",
                    input.tax_id
                )));
            }
        }

        supplier.tax_id = input.tax_id;
        supplier.name = input.name;
        supplier.contact_email = input.contact_email;
        supplier.contact_phone = input.contact_phone;
        self.store.put_supplier(supplier.clone())?;
        Ok(supplier)
    }

    pub fn delete_supplier(&self, id: Uuid) -> Result<Supplier, ServiceError> {
        let mut supplier = self.supplier(id)?;
        supplier.active = false;
        self.store.put_supplier(supplier.clone())?;
        Ok(supplier)
    }

    // -------------------------------------------------------------------
    // Payment methods
    // -------------------------------------------------------------------

    pub fn create_payment_method(
        &self,
        input: PaymentMethodInput,
    ) -> Result<PaymentMethod, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation(vec![FieldError::new(
                "name",
                "must not be empty",
            )]));
        }
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            active: true,
        };
        self.store.put_payment_method(method.clone())?;
        Ok(method)
    }

    pub fn payment_method(&self, id: Uuid) -> Result<PaymentMethod, ServiceError> {
        self.store
            .payment_method(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("payment method {}", id)))
    }

    pub fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, ServiceError> {
        Ok(self.store.list_payment_methods()?)
    }

    pub fn update_payment_method(
        &self,
        id: Uuid,
        input: PaymentMethodInput,
    ) -> Result<PaymentMethod, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation(vec![FieldError::new(
                "name",
                "must not be empty",
            )]));
        }
        let mut method = self.payment_method(id)?;
        method.name = input.name;
        method.description = input.description;
        self.store.put_payment_method(method.clone())?;
        Ok(method)
    }

    pub fn delete_payment_method(&self, id: Uuid) -> Result<PaymentMethod, ServiceError> {
        let mut method = self.payment_method(id)?;
        method.active = false;
        self.store.put_payment_method(method.clone())?;
        Ok(method)
    }
}

fn validate_product(input: &ProductInput) -> Result<(), ServiceError> {
    let mut errors = Vec::new();
    if input.code.trim().is_empty() {
        errors.push(FieldError::new("code", "must not be empty"));
    }
    if input.name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if input.unit_price <= Decimal::ZERO {
        errors.push(FieldError::new("unit_price", "must be greater than zero"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}
