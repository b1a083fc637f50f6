//! In-memory store backing every service.
//!
//! All tables live behind a single `RwLock`, so one write guard is the
//! transaction boundary: `commit_order` validates stock and performs every
//! write while holding it, which makes oversell through the
//! check-then-decrement gap impossible.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::error::StoreError;
use crate::domain::{
    Category, LineItem, Order, OrderStatus, PasswordResetToken, PaymentMethod, Product, Supplier,
    User,
};

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    suppliers: HashMap<Uuid, Supplier>,
    payment_methods: HashMap<Uuid, PaymentMethod>,
    users: HashMap<Uuid, User>,
    orders: HashMap<Uuid, Order>,
    line_items: HashMap<Uuid, LineItem>,
    reset_tokens: HashMap<Uuid, PasswordResetToken>,
}

/// Clone-friendly via Arc: clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    // -------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------

    pub fn put_product(&self, product: Product) -> Result<(), StoreError> {
        let mut tables = self.write("put_product")?;
        tables.products.insert(product.id, product);
        Ok(())
    }

    pub fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.read("product")?.products.get(&id).cloned())
    }

    pub fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let tables = self.read("list_products")?;
        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    pub fn products_by_category(&self, category_id: Uuid) -> Result<Vec<Product>, StoreError> {
        let tables = self.read("products_by_category")?;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    /// Apply a signed delta to a product's stock, flooring at zero.
    /// Returns the resulting stock.
    pub fn adjust_stock(&self, product_id: Uuid, delta: i64) -> Result<u32, StoreError> {
        let mut tables = self.write("adjust_stock")?;
        let product = tables
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::MissingProduct(product_id))?;
        let next = (product.stock as i64).saturating_add(delta).max(0);
        product.stock = next as u32;
        Ok(product.stock)
    }

    // -------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------

    pub fn put_category(&self, category: Category) -> Result<(), StoreError> {
        let mut tables = self.write("put_category")?;
        tables.categories.insert(category.id, category);
        Ok(())
    }

    pub fn category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        Ok(self.read("category")?.categories.get(&id).cloned())
    }

    pub fn category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let tables = self.read("category_by_name")?;
        Ok(tables
            .categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let tables = self.read("list_categories")?;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    // -------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------

    pub fn put_supplier(&self, supplier: Supplier) -> Result<(), StoreError> {
        let mut tables = self.write("put_supplier")?;
        tables.suppliers.insert(supplier.id, supplier);
        Ok(())
    }

    pub fn supplier(&self, id: Uuid) -> Result<Option<Supplier>, StoreError> {
        Ok(self.read("supplier")?.suppliers.get(&id).cloned())
    }

    pub fn supplier_by_tax_id(&self, tax_id: &str) -> Result<Option<Supplier>, StoreError> {
        let tables = self.read("supplier_by_tax_id")?;
        Ok(tables
            .suppliers
            .values()
            .find(|s| s.tax_id == tax_id)
            .cloned())
    }

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError> {
        let tables = self.read("list_suppliers")?;
        let mut suppliers: Vec<Supplier> = tables.suppliers.values().cloned().collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    // -------------------------------------------------------------------
    // Payment methods
    // -------------------------------------------------------------------

    pub fn put_payment_method(&self, method: PaymentMethod) -> Result<(), StoreError> {
        let mut tables = self.write("put_payment_method")?;
        tables.payment_methods.insert(method.id, method);
        Ok(())
    }

    pub fn payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, StoreError> {
        Ok(self.read("payment_method")?.payment_methods.get(&id).cloned())
    }

    pub fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, StoreError> {
        let tables = self.read("list_payment_methods")?;
        let mut methods: Vec<PaymentMethod> = tables.payment_methods.values().cloned().collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(methods)
    }

    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    pub fn put_user(&self, user: User) -> Result<(), StoreError> {
        let mut tables = self.write("put_user")?;
        tables.users.insert(user.id, user);
        Ok(())
    }

    pub fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read("user")?.users.get(&id).cloned())
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.read("user_by_email")?;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    pub fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: String,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.write("update_user_password")?;
        Ok(tables.users.get_mut(&user_id).map(|user| {
            user.password_hash = password_hash;
            user.clone()
        }))
    }

    // -------------------------------------------------------------------
    // Orders and line items
    // -------------------------------------------------------------------

    /// Persist an order with its line items and decrement stock, atomically.
    ///
    /// The stock check and every write happen under one write guard: on any
    /// shortfall or missing product nothing is persisted and no stock moves.
    pub fn commit_order(&self, order: &Order, items: &[LineItem]) -> Result<(), StoreError> {
        let mut tables = self.write("commit_order")?;

        for item in items {
            let product = tables
                .products
                .get(&item.product_id)
                .ok_or(StoreError::MissingProduct(item.product_id))?;
            if product.stock < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
        }

        tables.orders.insert(order.id, order.clone());
        for item in items {
            if let Some(product) = tables.products.get_mut(&item.product_id) {
                product.stock -= item.quantity;
            }
            tables.line_items.insert(item.id, item.clone());
        }

        Ok(())
    }

    /// Re-credit stock for a cancelled order's line items.
    pub fn restock(&self, items: &[LineItem]) -> Result<(), StoreError> {
        let mut tables = self.write("restock")?;
        for item in items {
            if let Some(product) = tables.products.get_mut(&item.product_id) {
                product.stock = product.stock.saturating_add(item.quantity);
            }
        }
        Ok(())
    }

    pub fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.read("order")?.orders.get(&id).cloned())
    }

    pub fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let tables = self.read("list_orders")?;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    pub fn orders_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let tables = self.read("orders_by_user")?;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    pub fn update_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut tables = self.write("update_order_status")?;
        Ok(tables.orders.get_mut(&order_id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }

    pub fn line_items_by_order(&self, order_id: Uuid) -> Result<Vec<LineItem>, StoreError> {
        let tables = self.read("line_items_by_order")?;
        let mut items: Vec<LineItem> = tables
            .line_items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    pub fn list_line_items(&self) -> Result<Vec<LineItem>, StoreError> {
        Ok(self.read("list_line_items")?.line_items.values().cloned().collect())
    }

    // -------------------------------------------------------------------
    // Password reset tokens
    // -------------------------------------------------------------------

    pub fn put_reset_token(&self, token: PasswordResetToken) -> Result<(), StoreError> {
        let mut tables = self.write("put_reset_token")?;
        tables.reset_tokens.insert(token.id, token);
        Ok(())
    }

    pub fn reset_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        let tables = self.read("reset_token_by_hash")?;
        Ok(tables
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    pub fn mark_token_used(&self, token_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.write("mark_token_used")?;
        if let Some(token) = tables.reset_tokens.get_mut(&token_id) {
            token.used = true;
        }
        Ok(())
    }

    pub fn count_reset_tokens(&self) -> Result<usize, StoreError> {
        Ok(self.read("count_reset_tokens")?.reset_tokens.len())
    }
}
