//! Product Repository

use super::{RepoError, RepoResult, to_json};
use crate::db::DbService;
use shared::models::{MAX_STOCK, Pagination, Product, ProductCreate, ProductUpdate};
use shared::util::{new_id, now_millis};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, name, description, price, weight, stock, category, images, \
                       is_active, is_featured, created_at, updated_at";

#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id_in(&mut conn, id).await
    }

    /// Active products, newest first
    pub async fn find_active(&self, page: Pagination) -> RepoResult<(Vec<Product>, u64)> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products WHERE is_active = 1 \
             ORDER BY created_at DESC, id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok((products, total as u64))
    }

    /// Active featured products, newest first
    pub async fn find_featured(&self, limit: u32) -> RepoResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products WHERE is_active = 1 AND is_featured = 1 \
             ORDER BY created_at DESC, id LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Active products whose name or description contains `term`
    /// (ASCII case-insensitive)
    pub async fn search(&self, term: &str, limit: u32) -> RepoResult<Vec<Product>> {
        let pattern = format!("%{}%", escape_like(term));
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products WHERE is_active = 1 \
             AND (name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\') \
             ORDER BY created_at DESC, id LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let now = now_millis();
        let product = Product {
            id: new_id(),
            name: data.name,
            description: data.description,
            price: data.price,
            weight: data.weight,
            stock: data.stock,
            category: data.category,
            images: data.images,
            is_active: true,
            is_featured: data.is_featured,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(&format!(
            "INSERT INTO products ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.weight)
        .bind(product.stock)
        .bind(&product.category)
        .bind(to_json(&product.images)?)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(product)
    }

    /// Partial update; stock only moves through [`try_adjust_stock`]
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let images = data.images.as_ref().map(to_json).transpose()?;
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET name = COALESCE(?1, name), description = COALESCE(?2, description), \
             price = COALESCE(?3, price), weight = COALESCE(?4, weight), \
             category = COALESCE(?5, category), images = COALESCE(?6, images), \
             is_active = COALESCE(?7, is_active), is_featured = COALESCE(?8, is_featured), \
             updated_at = ?9 WHERE id = ?10 RETURNING {COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .bind(data.weight)
        .bind(data.category)
        .bind(images)
        .bind(data.is_active)
        .bind(data.is_featured)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id}")))
    }
}

pub async fn find_by_id_in(conn: &mut SqliteConnection, id: &str) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

/// Move stock by `delta` unless the result would leave `0..=MAX_STOCK`
///
/// A single conditional UPDATE, so concurrent callers serialize on the
/// write lock. `None` means nothing changed because the product is missing
/// or the bound would be crossed. `delta` must stay within
/// [`shared::models::MAX_STOCK_DELTA`] so the sum cannot overflow.
pub async fn try_adjust_stock(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET stock = stock + ?1, updated_at = ?2 \
         WHERE id = ?3 AND stock + ?1 BETWEEN 0 AND ?4 RETURNING {COLUMNS}"
    ))
    .bind(delta)
    .bind(now_millis())
    .bind(id)
    .bind(MAX_STOCK)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
