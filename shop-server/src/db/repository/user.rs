//! User Repository

use super::{RepoError, RepoResult};
use crate::db::DbService;
use shared::models::{UserResponse, UserRole};
use shared::util::now_millis;
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, email, password_hash, name, phone, role, is_active, created_at, updated_at";

/// Stored account, including the password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    /// Lower-cased; UNIQUE
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<UserRecord> for UserResponse {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a new account; a taken email fails with `Duplicate`
    pub async fn create(&self, user: &UserRecord) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO users ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite the fields that are `Some`
    pub async fn update_profile(
        &self,
        id: &str,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> RepoResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET name = COALESCE(?, name), phone = COALESCE(?, phone), \
             updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
        ))
        .bind(name)
        .bind(phone)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id}")))
    }
}
