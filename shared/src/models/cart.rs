//! Cart Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Most units of one product a cart line can hold
pub const MAX_CART_QUANTITY: i64 = 10_000;

/// Cart line with the product snapshot taken when it was last touched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub product_id: String,
    pub product_name: String,
    pub product_price: f64,
    /// First product image, empty when the product has none
    pub product_image: String,
    pub quantity: i64,
}

/// One cart per user; an empty cart has `updated_at == 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItemAdd {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1, max = 10_000))]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItemUpdate {
    #[validate(range(min = 1, max = 10_000))]
    pub quantity: i64,
}

/// Guest cart merged into the account cart after login
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartSync {
    #[validate(nested)]
    pub items: Vec<CartItemAdd>,
}
