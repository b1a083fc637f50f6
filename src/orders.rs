//! Order placement and payment reconciliation.
//!
//! Placement validates the request, snapshots current prices, and hands a
//! fully-built order to `MemoryStore::commit_order`, which checks stock and
//! writes everything under one guard — an order either lands completely
//! (header, line items, stock decrements) or not at all.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{LineItem, Order, OrderStatus};
use crate::error::ServiceError;
use crate::payments::{BackUrls, CheckoutItem, CheckoutRequest, PaymentNotification};
use crate::store::MemoryStore;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub payment_method_id: Uuid,
    pub items: Vec<OrderItemRequest>,
}

/// An order header together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub line_items: Vec<LineItem>,
}

#[derive(Clone)]
pub struct OrderService {
    store: MemoryStore,
}

impl OrderService {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Place an order: validate, snapshot prices, compute the total, and
    /// commit atomically. Stock shortfalls surface as `InsufficientStock`
    /// naming the product, with nothing persisted.
    pub fn place_order(&self, request: NewOrder) -> Result<OrderDetail, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "order must contain at least one item".into(),
            ));
        }
        for item in &request.items {
            if item.quantity == 0 {
                return Err(ServiceError::InvalidArgument(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
        }

        if self.store.user(request.user_id)?.is_none() {
            return Err(ServiceError::NotFound(format!("user {}", request.user_id)));
        }
        if self.store.payment_method(request.payment_method_id)?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "payment method {}",
                request.payment_method_id
            )));
        }

        let order_id = Uuid::new_v4();
        let mut line_items = Vec::with_capacity(request.items.len());
        let mut total = Decimal::ZERO;
        for item in &request.items {
            let product = self
                .store
                .product(item.product_id)?
                .ok_or_else(|| ServiceError::NotFound(format!("product {}", item.product_id)))?;

            // price snapshot: later catalog changes do not touch this order
            let subtotal = product.unit_price * Decimal::from(item.quantity);
            total += subtotal;
            line_items.push(LineItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: product.id,
                quantity: item.quantity,
                unit_price: product.unit_price,
                subtotal,
            });
        }

        let order = Order {
            id: order_id,
            total,
            status: OrderStatus::Created,
            created_at: Utc::now(),
            user_id: request.user_id,
            payment_method_id: request.payment_method_id,
        };
        self.store.commit_order(&order, &line_items)?;
        tracing::info!(order = %order.id, total = %order.total, items = line_items.len(), "order placed");

        Ok(OrderDetail { order, line_items })
    }

    pub fn order(&self, id: Uuid) -> Result<OrderDetail, ServiceError> {
        let order = self
            .store
            .order(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", id)))?;
        let line_items = self.store.line_items_by_order(id)?;
        Ok(OrderDetail { order, line_items })
    }

    pub fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.list_orders()?)
    }

    pub fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.orders_by_user(user_id)?)
    }

    /// Administrative status transition. Moving into Cancelled re-credits
    /// stock, same as a cancellation webhook.
    pub fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, ServiceError> {
        let order = self
            .store
            .order(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", id)))?;
        self.transition(order, status)
    }

    /// Reconcile an asynchronous payment callback against its order.
    ///
    /// The external reference embedded in the checkout request comes back
    /// here and is the order id.
    pub fn apply_payment_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<Order, ServiceError> {
        let order_id = Uuid::parse_str(&notification.external_reference).map_err(|_| {
            ServiceError::InvalidArgument(format!(
                "malformed external reference '{}'",
                notification.external_reference
            ))
        })?;
        let order = self
            .store
            .order(order_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

        let next = crate::payments::map_gateway_status(&notification.status);
        tracing::info!(order = %order_id, status = %notification.status, next = %next, "payment notification");
        self.transition(order, next)
    }

    /// Build the checkout preference for an order: line items with their
    /// snapshotted prices, the payer's email, redirect URLs, and the order
    /// id as the correlating external reference.
    pub fn checkout_request(
        &self,
        order_id: Uuid,
        back_urls: BackUrls,
    ) -> Result<CheckoutRequest, ServiceError> {
        let detail = self.order(order_id)?;
        let payer = self
            .store
            .user(detail.order.user_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", detail.order.user_id)))?;

        let mut items = Vec::with_capacity(detail.line_items.len());
        for line in &detail.line_items {
            let title = self
                .store
                .product(line.product_id)?
                .map(|p| p.name)
                .unwrap_or_else(|| format!("product {}", line.product_id));
            items.push(CheckoutItem {
                title,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        Ok(CheckoutRequest {
            external_reference: detail.order.id.to_string(),
            payer_email: payer.email,
            items,
            back_urls,
        })
    }

    fn transition(&self, order: Order, next: OrderStatus) -> Result<Order, ServiceError> {
        if next == order.status {
            return Ok(order);
        }

        // a cancellation releases the stock the order consumed; the status
        // check keeps repeated cancellation callbacks from double-crediting
        if next == OrderStatus::Cancelled {
            let items = self.store.line_items_by_order(order.id)?;
            self.store.restock(&items)?;
        }

        self.store
            .update_order_status(order.id, next)?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order.id)))
    }
}
