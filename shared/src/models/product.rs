//! Product Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Unit price in currency unit
    pub price: f64,
    /// Weight in grams
    pub weight: i32,
    /// Units on hand, never negative
    pub stock: i64,
    pub category: String,
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(json))]
    pub images: Vec<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 3, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1))]
    pub weight: i32,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub stock: i64,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Update product payload
///
/// Stock is not updatable here; it only moves through the stock endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 3, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 1))]
    pub weight: Option<i32>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Most units a product can hold
pub const MAX_STOCK: i64 = 1_000_000_000;
/// Most units one adjustment can move either way
pub const MAX_STOCK_DELTA: i64 = 1_000_000;

/// Signed stock delta: negative reserves, positive restores
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StockAdjustment {
    #[validate(range(min = -1_000_000, max = 1_000_000))]
    pub quantity: i64,
}

/// Paginated product listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}
