//! Order State Machine
//!
//! ```text
//! PENDING    -> CONFIRMED | CANCELLED
//! CONFIRMED  -> PROCESSING | CANCELLED
//! PROCESSING -> SHIPPED | CANCELLED
//! SHIPPED    -> DELIVERED
//! DELIVERED, CANCELLED: terminal
//! ```
//!
//! Entering CANCELLED puts every line item back into stock in the same
//! transaction that writes the status. Payment status moves freely; APPROVED
//! also confirms the order when the table allows it.

use super::inventory::InventoryLedger;
use crate::db::DbService;
use crate::db::repository::order::{set_payment_in, transition_in};
use crate::db::repository::{OrderRepository, commit};
use shared::models::{Order, OrderStatus, PaymentStatus, PaymentStatusUpdate};
use shared::{AppError, AppResult, ErrorCode};

/// Statuses reachable in one step from `from`
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[Processing, Cancelled],
        Processing => &[Shipped, Cancelled],
        Shipped => &[Delivered],
        Delivered | Cancelled => &[],
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

pub fn ensure_transition(from: OrderStatus, to: OrderStatus) -> AppResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::invalid_transition(from, to))
    }
}

pub(crate) fn order_not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
        .with_detail("order_id", id)
}

#[derive(Clone)]
pub struct OrderStateMachine {
    db: DbService,
    orders: OrderRepository,
}

impl OrderStateMachine {
    pub fn new(db: DbService) -> Self {
        let orders = OrderRepository::new(&db);
        Self { db, orders }
    }

    /// Move the order to `next`, restoring stock when cancelling
    ///
    /// The status write and every restoration commit together. The write
    /// only matches while the order is still in the status that was checked,
    /// so of two racing requests exactly one wins.
    pub async fn update_status(&self, id: &str, next: OrderStatus) -> AppResult<Order> {
        let order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        let from = order.status;
        ensure_transition(from, next)?;

        let items = if next == OrderStatus::Cancelled {
            self.orders.find_items(id).await?
        } else {
            Vec::new()
        };

        let mut tx = self.db.begin().await?;
        if !transition_in(&mut tx, id, from, next).await? {
            drop(tx);
            let current = self
                .orders
                .find_by_id(id)
                .await?
                .ok_or_else(|| order_not_found(id))?;
            tracing::info!(
                order_id = %id,
                from = %from,
                now = %current.status,
                "Order moved concurrently, transition refused"
            );
            return Err(AppError::invalid_transition(current.status, next));
        }
        for item in &items {
            InventoryLedger::adjust_in(&mut tx, &item.product_id, item.quantity).await?;
        }
        commit(tx).await?;

        let order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        if next == OrderStatus::Cancelled {
            tracing::info!(
                order_id = %order.id,
                order_number = %order.order_number,
                from = %from,
                items = items.len(),
                "Order cancelled, stock restored"
            );
        } else {
            tracing::info!(order_id = %order.id, from = %from, to = %next, "Order status updated");
        }
        Ok(order)
    }

    /// Record a payment status; APPROVED confirms the order when legal
    pub async fn update_payment_status(
        &self,
        id: &str,
        update: PaymentStatusUpdate,
    ) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let mut order = set_payment_in(
            &mut tx,
            id,
            update.payment_status,
            update.mp_payment_id.as_deref(),
        )
        .await?
        .ok_or_else(|| order_not_found(id))?;

        let mut skipped_from = None;
        if update.payment_status == PaymentStatus::Approved {
            if can_transition(order.status, OrderStatus::Confirmed) {
                transition_in(&mut tx, id, order.status, OrderStatus::Confirmed).await?;
                order.status = OrderStatus::Confirmed;
            } else {
                skipped_from = Some(order.status);
            }
        }
        commit(tx).await?;

        match (update.payment_status, skipped_from) {
            (PaymentStatus::Approved, None) => tracing::info!(
                order_id = %order.id,
                order_number = %order.order_number,
                "Payment approved, order confirmed"
            ),
            (PaymentStatus::Approved, Some(status)) => tracing::warn!(
                order_id = %order.id,
                status = %status,
                "Payment approved but order cannot move to CONFIRMED, status left unchanged"
            ),
            (payment_status, _) => tracing::info!(
                order_id = %order.id,
                payment_status = %payment_status,
                "Payment status updated"
            ),
        }
        Ok(order)
    }
}
