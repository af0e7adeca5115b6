//! Submitted orders and the store that keeps them.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use parfum_core::{OrderId, OrderStatus, PaymentStatus, Price};

use super::{Customer, OrderDraft, PaymentMethod, ShippingInfo};
use crate::cart::LineItem;

/// Errors from an order store.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// No order with this id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The requested fulfillment status change is not allowed.
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The store could not be reached or refused the write.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer: Customer,
    pub line_items: Vec<LineItem>,
    pub total: Price,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A new order in its initial state (`processing`, payment `pending`).
    #[must_use]
    pub fn from_draft(id: OrderId, draft: &OrderDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            customer: draft.customer().clone(),
            line_items: draft.line_items().to_vec(),
            total: draft.total(),
            shipping: draft.shipping().clone(),
            payment_method: draft.payment_method(),
            payment_status: PaymentStatus::default(),
            status: OrderStatus::default(),
            notes: draft.notes().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Dashboard figures over all orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    /// Orders still `processing`.
    pub pending_orders: usize,
    /// Sum of totals of `completed` orders.
    pub revenue: Decimal,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        Self {
            total_orders: orders.len(),
            pending_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Processing)
                .count(),
            revenue: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Completed)
                .map(|o| o.total.amount)
                .sum(),
        }
    }
}

/// Storage for submitted orders.
///
/// Fulfillment status and payment status are independent and are updated
/// through separate calls.
pub trait OrderStore: Send + Sync {
    /// Store a new order and return its id.
    fn create(
        &self,
        draft: &OrderDraft,
    ) -> impl Future<Output = Result<OrderId, OrderStoreError>> + Send;

    /// Fetch one order.
    fn get(&self, id: &OrderId) -> impl Future<Output = Result<Order, OrderStoreError>> + Send;

    /// Move an order to `status`, rejecting illegal transitions.
    fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<Order, OrderStoreError>> + Send;

    /// Set an order's payment status. Any payment status may follow any
    /// other.
    fn update_payment_status(
        &self,
        id: &OrderId,
        status: PaymentStatus,
    ) -> impl Future<Output = Result<Order, OrderStoreError>> + Send;

    /// Orders newest first, optionally only those with `status`.
    fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = Result<Vec<Order>, OrderStoreError>> + Send;

    /// Dashboard figures.
    fn stats(&self) -> impl Future<Output = Result<OrderStats, OrderStoreError>> + Send {
        async { Ok(OrderStats::from_orders(&self.list_orders(None).await?)) }
    }
}

// =============================================================================
// MemoryOrderStore
// =============================================================================

/// Orders held in process memory.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<Order>>,
    fail_writes: AtomicBool,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Order>>, OrderStoreError> {
        self.orders
            .read()
            .map_err(|_| OrderStoreError::Unavailable("Lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Order>>, OrderStoreError> {
        self.orders
            .write()
            .map_err(|_| OrderStoreError::Unavailable("Lock poisoned".to_string()))
    }

    fn update(
        &self,
        id: &OrderId,
        apply: impl FnOnce(&mut Order) -> Result<bool, OrderStoreError>,
    ) -> Result<Order, OrderStoreError> {
        let mut orders = self.write()?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == *id)
            .ok_or_else(|| OrderStoreError::NotFound(id.clone()))?;
        if apply(order)? {
            order.updated_at = Utc::now();
        }
        Ok(order.clone())
    }
}

impl OrderStore for MemoryOrderStore {
    async fn create(&self, draft: &OrderDraft) -> Result<OrderId, OrderStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(OrderStoreError::Unavailable("writes disabled".to_string()));
        }
        let id = OrderId::new(Uuid::new_v4().to_string());
        let order = Order::from_draft(id.clone(), draft, Utc::now());
        self.write()?.push(order);
        Ok(id)
    }

    async fn get(&self, id: &OrderId) -> Result<Order, OrderStoreError> {
        self.read()?
            .iter()
            .find(|o| o.id == *id)
            .cloned()
            .ok_or_else(|| OrderStoreError::NotFound(id.clone()))
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderStoreError> {
        self.update(id, |order| {
            if !order.status.can_transition_to(status) {
                return Err(OrderStoreError::InvalidTransition {
                    from: order.status,
                    to: status,
                });
            }
            let changed = order.status != status;
            if changed {
                info!(order_id = %order.id, from = %order.status, to = %status, "Order status updated");
            }
            order.status = status;
            Ok(changed)
        })
    }

    async fn update_payment_status(
        &self,
        id: &OrderId,
        status: PaymentStatus,
    ) -> Result<Order, OrderStoreError> {
        self.update(id, |order| {
            let changed = order.payment_status != status;
            if changed {
                info!(order_id = %order.id, from = %order.payment_status, to = %status, "Payment status updated");
            }
            order.payment_status = status;
            Ok(changed)
        })
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, OrderStoreError> {
        let mut orders: Vec<Order> = self
            .read()?
            .iter()
            .rev()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!(count = orders.len(), filter = ?status, "Listed orders");
        Ok(orders)
    }
}
