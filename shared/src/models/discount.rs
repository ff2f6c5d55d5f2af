//! Discount Code Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum DiscountType {
    /// `value` is a percentage of the purchase total (0, 100]
    Percentage,
    /// `value` is a flat amount in currency unit
    FixedAmount,
}

/// Discount code entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiscountCode {
    pub id: String,
    /// Stored upper-case; lookups are case-insensitive
    pub code: String,
    pub description: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: f64,
    pub min_purchase: Option<f64>,
    pub max_uses: Option<i64>,
    pub used_count: i64,
    /// Validity window start (Unix millis)
    pub start_date: i64,
    /// Validity window end (Unix millis)
    pub end_date: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create discount code payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiscountCodeCreate {
    #[validate(length(min = 3, max = 20))]
    pub code: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    #[validate(range(exclusive_min = 0.0))]
    pub value: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub min_purchase: Option<f64>,
    #[validate(range(min = 1))]
    pub max_uses: Option<i64>,
    pub start_date: i64,
    pub end_date: i64,
    #[serde(default)]
    pub is_active: bool,
}

/// Update discount code payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DiscountCodeUpdate {
    #[validate(length(min = 3, max = 20))]
    pub code: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: Option<DiscountType>,
    #[validate(range(exclusive_min = 0.0))]
    pub value: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub min_purchase: Option<f64>,
    #[validate(range(min = 1))]
    pub max_uses: Option<i64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiscountValidateRequest {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(range(exclusive_min = 0.0))]
    pub purchase_total: f64,
}

/// Outcome of checking a code against a purchase total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountValidation {
    pub valid: bool,
    pub discount_code: Option<DiscountCode>,
    pub discount_amount: f64,
    pub message: String,
}

/// Paginated discount code listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCodeListResponse {
    pub discount_codes: Vec<DiscountCode>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}
