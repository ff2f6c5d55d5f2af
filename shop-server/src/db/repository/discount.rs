//! Discount Code Repository
//!
//! `code` carries a UNIQUE index; racing inserts of the same code surface
//! as [`super::RepoError::Duplicate`].

use super::RepoResult;
use crate::db::DbService;
use shared::models::{DiscountCode, Pagination};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, code, description, discount_type, value, min_purchase, max_uses, \
                       used_count, start_date, end_date, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<DiscountCode>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id_in(&mut conn, id).await
    }

    /// Exact match on the stored (upper-case) code
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<DiscountCode>> {
        let discount = sqlx::query_as::<_, DiscountCode>(&format!(
            "SELECT {COLUMNS} FROM discount_codes WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(discount)
    }

    /// Newest first
    pub async fn find_all(&self, page: Pagination) -> RepoResult<(Vec<DiscountCode>, u64)> {
        let codes = sqlx::query_as::<_, DiscountCode>(&format!(
            "SELECT {COLUMNS} FROM discount_codes ORDER BY created_at DESC, id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM discount_codes")
            .fetch_one(&self.pool)
            .await?;
        Ok((codes, total as u64))
    }

    pub async fn insert(&self, discount: &DiscountCode) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO discount_codes ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&discount.id)
        .bind(&discount.code)
        .bind(&discount.description)
        .bind(discount.discount_type)
        .bind(discount.value)
        .bind(discount.min_purchase)
        .bind(discount.max_uses)
        .bind(discount.used_count)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM discount_codes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub async fn find_by_id_in(
    conn: &mut SqliteConnection,
    id: &str,
) -> RepoResult<Option<DiscountCode>> {
    let discount = sqlx::query_as::<_, DiscountCode>(&format!(
        "SELECT {COLUMNS} FROM discount_codes WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(discount)
}

/// Bump `updated_at`, taking the write lock for the rest of the transaction
///
/// `false` means the code does not exist.
pub async fn touch_in(conn: &mut SqliteConnection, id: &str) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE discount_codes SET updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Overwrite every mutable column; `used_count` is left alone
pub async fn save_in(conn: &mut SqliteConnection, discount: &DiscountCode) -> RepoResult<()> {
    sqlx::query(
        "UPDATE discount_codes SET code = ?, description = ?, discount_type = ?, value = ?, \
         min_purchase = ?, max_uses = ?, start_date = ?, end_date = ?, is_active = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(&discount.code)
    .bind(&discount.description)
    .bind(discount.discount_type)
    .bind(discount.value)
    .bind(discount.min_purchase)
    .bind(discount.max_uses)
    .bind(discount.start_date)
    .bind(discount.end_date)
    .bind(discount.is_active)
    .bind(discount.updated_at)
    .bind(&discount.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Count one use unless `max_uses` is already reached
///
/// `false` means the code is missing or exhausted.
pub async fn consume_in(conn: &mut SqliteConnection, id: &str) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE discount_codes SET used_count = used_count + 1, updated_at = ? \
         WHERE id = ? AND (max_uses IS NULL OR used_count < max_uses)",
    )
    .bind(now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
