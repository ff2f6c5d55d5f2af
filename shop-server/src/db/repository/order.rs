//! Order Repository
//!
//! Order headers and their line items live in separate tables; items keep
//! the position they had in the checkout payload.

use super::{RepoResult, to_json};
use crate::db::DbService;
use shared::models::{Order, OrderItem, OrderStatus, Pagination, PaymentStatus};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, order_number, user_id, customer_name, customer_email, customer_phone, \
                       subtotal, discount, total, payment_method, payment_status, mp_payment_id, \
                       status, shipping_address, discount_code_id, utm_source, utm_medium, \
                       utm_campaign, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, price, subtotal";

#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("SELECT {COLUMNS} FROM orders WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {COLUMNS} FROM orders WHERE order_number = ? ORDER BY created_at LIMIT 1"
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    /// Line items in checkout order
    pub async fn find_items(&self, order_id: &str) -> RepoResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY position"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// A user's orders, newest first
    pub async fn find_by_user(
        &self,
        user_id: &str,
        page: Pagination,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {COLUMNS} FROM orders WHERE user_id = ? \
             ORDER BY created_at DESC, id LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((orders, total as u64))
    }

    /// Every order, newest first
    pub async fn find_all(&self, page: Pagination) -> RepoResult<(Vec<Order>, u64)> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {COLUMNS} FROM orders ORDER BY created_at DESC, id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok((orders, total as u64))
    }
}

pub async fn insert_in(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(&format!(
        "INSERT INTO orders ({COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.user_id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(order.subtotal)
    .bind(order.discount)
    .bind(order.total)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(&order.mp_payment_id)
    .bind(order.status)
    .bind(to_json(&order.shipping_address)?)
    .bind(&order.discount_code_id)
    .bind(&order.utm_source)
    .bind(&order.utm_medium)
    .bind(&order.utm_campaign)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_items_in(conn: &mut SqliteConnection, items: &[OrderItem]) -> RepoResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(&format!(
            "INSERT INTO order_items ({ITEM_COLUMNS}, position) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.subtotal)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Move the order from `from` to `to` only if it is still in `from`
///
/// `false` means the order is missing or another writer moved it first.
pub async fn transition_in(
    conn: &mut SqliteConnection,
    id: &str,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool> {
    let result =
        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(to)
            .bind(now_millis())
            .bind(id)
            .bind(from)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}

/// Record a payment outcome; the gateway reference is kept when absent
pub async fn set_payment_in(
    conn: &mut SqliteConnection,
    id: &str,
    status: PaymentStatus,
    mp_payment_id: Option<&str>,
) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "UPDATE orders SET payment_status = ?, mp_payment_id = COALESCE(?, mp_payment_id), \
         updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(mp_payment_id)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
