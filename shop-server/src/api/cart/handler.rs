//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Cart, CartItemAdd, CartItemUpdate, CartSync};
use shared::{ApiResponse, AppResult};

use crate::api::extract::ValidJson;
use crate::auth::CurrentUser;
use crate::core::ServerState;

/// GET /cart
pub async fn get(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = state.carts.get(&user.id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// POST /cart/items - adds to an existing line
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<CartItemAdd>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = state.carts.add_item(&user.id, payload).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Product added to cart",
        cart,
    )))
}

/// PUT /cart/items/{product_id} - replaces the quantity
pub async fn update_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    ValidJson(payload): ValidJson<CartItemUpdate>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = state
        .carts
        .update_item(&user.id, &product_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// DELETE /cart/items/{product_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = state.carts.remove_item(&user.id, &product_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// DELETE /cart
pub async fn clear(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    state.carts.clear(&user.id).await?;
    Ok(Json(ApiResponse::ok()))
}

/// POST /cart/sync - merge a guest cart after login
pub async fn sync(
    State(state): State<ServerState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<CartSync>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = state.carts.sync(&user.id, payload).await?;
    Ok(Json(ApiResponse::success_with_message("Cart synced", cart)))
}
