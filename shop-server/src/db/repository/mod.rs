//! Repository Module
//!
//! Typed SQL over the shop tables, one repository per aggregate. Methods
//! that take a `&mut SqliteConnection` run inside the caller's transaction.

pub mod cart;
pub mod discount;
pub mod order;
pub mod product;
pub mod user;

// Re-exports
pub use cart::CartRepository;
pub use discount::DiscountRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::{UserRecord, UserRepository};

use shared::AppError;
use sqlx::{Sqlite, Transaction};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A UNIQUE constraint rejected the write
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// No connection or write lock within the configured timeout
    #[error("Store timeout: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Primary SQLite result code for a locked database
const SQLITE_BUSY: i32 = 5;

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::PoolTimedOut => RepoError::Timeout(err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                RepoError::Serialization(err.to_string())
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            sqlx::Error::Database(db)
                if db
                    .code()
                    .and_then(|c| c.parse::<i32>().ok())
                    .is_some_and(|c| c & 0xff == SQLITE_BUSY) =>
            {
                RepoError::Timeout(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Timeout(msg) => AppError::timeout(format!("Store timeout: {msg}")),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Serialization(msg) => AppError::internal(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

pub async fn commit(tx: Transaction<'_, Sqlite>) -> RepoResult<()> {
    tx.commit().await?;
    Ok(())
}

/// Serialize a JSON column value
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> RepoResult<String> {
    serde_json::to_string(value).map_err(|e| RepoError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::ErrorCode;

    #[test]
    fn test_repo_error_to_app_error() {
        let cases = [
            (RepoError::NotFound("x".into()), ErrorCode::NotFound),
            (RepoError::Duplicate("x".into()), ErrorCode::AlreadyExists),
            (RepoError::Timeout("x".into()), ErrorCode::TimeoutError),
            (RepoError::Database("x".into()), ErrorCode::DatabaseError),
            (RepoError::Serialization("x".into()), ErrorCode::InternalError),
        ];
        for (repo, code) in cases {
            assert_eq!(AppError::from(repo).code, code);
        }
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_duplicate() {
        let db = DbService::in_memory().await.unwrap();
        let insert = "INSERT INTO users (id, email, password_hash, name, phone, created_at, updated_at) \
                      VALUES (?, 'same@shop.co', 'x', 'Ann', '1', 0, 0)";
        sqlx::query(insert).bind("u1").execute(&db.pool).await.unwrap();
        let err = sqlx::query(insert).bind("u2").execute(&db.pool).await.unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::Duplicate(_)));
    }

    #[test]
    fn test_missing_row_maps_to_not_found() {
        assert!(matches!(
            RepoError::from(sqlx::Error::RowNotFound),
            RepoError::NotFound(_)
        ));
        assert!(matches!(
            RepoError::from(sqlx::Error::PoolTimedOut),
            RepoError::Timeout(_)
        ));
    }
}
