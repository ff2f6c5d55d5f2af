//! Cart Repository
//!
//! One row per (user, product). Quantities are capped at
//! [`MAX_CART_QUANTITY`] when merged.

use super::RepoResult;
use crate::db::DbService;
use shared::models::{CartItem, MAX_CART_QUANTITY, Product};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const ITEM_COLUMNS: &str = "product_id, product_name, product_price, product_image, quantity";

/// How an upsert treats the snapshot of a line that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot {
    /// Keep what was captured when the line was first added
    Keep,
    /// Replace name and price; replace the image when the product has one
    Refresh,
}

#[derive(Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    /// Lines in the order they were first added, plus the last change time
    pub async fn find(&self, user_id: &str) -> RepoResult<(Vec<CartItem>, i64)> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE user_id = ? ORDER BY rowid"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let (updated_at,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(updated_at) FROM cart_items WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok((items, updated_at.unwrap_or(0)))
    }

    pub async fn add(&self, user_id: &str, product: &Product, quantity: i64) -> RepoResult<()> {
        let mut conn = self.pool.acquire().await?;
        add_in(&mut conn, user_id, product, quantity, Snapshot::Keep).await
    }

    /// `false` when the product is not in the cart
    pub async fn set_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?, updated_at = ? WHERE user_id = ? AND product_id = ?",
        )
        .bind(quantity)
        .bind(now_millis())
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn remove(&self, user_id: &str, product_id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(&self, user_id: &str) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Insert a line or add `quantity` to the existing one
pub async fn add_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    product: &Product,
    quantity: i64,
    snapshot: Snapshot,
) -> RepoResult<()> {
    let on_conflict = match snapshot {
        Snapshot::Keep => "",
        Snapshot::Refresh => {
            ", product_name = excluded.product_name, product_price = excluded.product_price, \
             product_image = CASE WHEN excluded.product_image = '' \
             THEN cart_items.product_image ELSE excluded.product_image END"
        }
    };
    sqlx::query(&format!(
        "INSERT INTO cart_items (user_id, {ITEM_COLUMNS}, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET \
         quantity = MIN(cart_items.quantity + excluded.quantity, ?8), \
         updated_at = excluded.updated_at{on_conflict}"
    ))
    .bind(user_id)
    .bind(&product.id)
    .bind(&product.name)
    .bind(product.price)
    .bind(product.images.first().map(String::as_str).unwrap_or_default())
    .bind(quantity.min(MAX_CART_QUANTITY))
    .bind(now_millis())
    .bind(MAX_CART_QUANTITY)
    .execute(conn)
    .await?;
    Ok(())
}
