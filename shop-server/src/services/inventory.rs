//! Inventory Ledger
//!
//! The only path that changes product stock. Each adjustment is one
//! conditional UPDATE, so concurrent adjustments of the same product never
//! lose updates and stock stays within `0..=MAX_STOCK`.

use crate::db::DbService;
use crate::db::repository::product::{find_by_id_in, try_adjust_stock};
use shared::models::{MAX_STOCK, MAX_STOCK_DELTA, Product};
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqliteConnection;

#[derive(Clone)]
pub struct InventoryLedger {
    db: DbService,
}

impl InventoryLedger {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    /// Apply a signed stock delta: negative reserves, positive restores
    ///
    /// Fails with `InsufficientStock` when `stock + delta < 0`, leaving the
    /// product untouched.
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> AppResult<Product> {
        let mut conn = self.db.acquire().await?;
        Self::adjust_in(&mut conn, product_id, delta).await
    }

    /// [`InventoryLedger::adjust_stock`] inside the caller's transaction
    pub async fn adjust_in(
        conn: &mut SqliteConnection,
        product_id: &str,
        delta: i64,
    ) -> AppResult<Product> {
        if delta.checked_abs().is_none_or(|d| d > MAX_STOCK_DELTA) {
            return Err(AppError::validation(format!(
                "Stock adjustment must be within ±{MAX_STOCK_DELTA}"
            ))
            .with_detail("quantity", delta));
        }

        if let Some(product) = try_adjust_stock(&mut *conn, product_id, delta).await? {
            tracing::debug!(product_id, delta, stock = product.stock, "Stock adjusted");
            return Ok(product);
        }

        // Nothing moved; find out why
        match find_by_id_in(conn, product_id).await? {
            None => Err(product_not_found(product_id)),
            Some(product) if product.stock + delta < 0 => Err(AppError::insufficient_stock(
                &product.id,
                &product.name,
                -delta,
                product.stock,
            )),
            Some(product) => Err(AppError::validation(format!(
                "Stock cannot exceed {MAX_STOCK}"
            ))
            .with_detail("product_id", product.id)
            .with_detail("available", product.stock)),
        }
    }

    /// Take `quantity` units out of stock
    pub async fn reserve(&self, product_id: &str, quantity: i64) -> AppResult<Product> {
        self.adjust_stock(product_id, -quantity).await
    }

    /// Put `quantity` units back into stock
    pub async fn restore(&self, product_id: &str, quantity: i64) -> AppResult<Product> {
        self.adjust_stock(product_id, quantity).await
    }
}

pub(crate) fn product_not_found(product_id: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ProductNotFound,
        format!("Product {product_id} not found"),
    )
    .with_detail("product_id", product_id)
}
