//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use http::StatusCode;
use serde::Deserialize;
use shared::models::{
    PageQuery, Product, ProductCreate, ProductListResponse, ProductUpdate, StockAdjustment,
};
use shared::{ApiResponse, AppResult};

use crate::api::extract::{ValidJson, pagination};
use crate::core::ServerState;

/// `?q=...&limit=...`; an unparsable limit counts as absent
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<String>,
}

/// GET /products - active products, newest first
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<ProductListResponse>>> {
    let products = state.catalog.list(pagination(query)).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// GET /products/search?q=&limit=
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let limit = query.limit.as_deref().and_then(|l| l.trim().parse().ok());
    let products = state.catalog.search(&query.q, limit).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// GET /products/featured
pub async fn featured(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = state.catalog.featured().await?;
    Ok(Json(ApiResponse::success(products)))
}

/// GET /products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state.catalog.get(&id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// POST /products
pub async fn create(
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<ProductCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let product = state.catalog.create(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// PUT /products/{id} - partial update; `is_active=false` hides the product
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<ProductUpdate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state.catalog.update(&id, payload).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// PATCH /products/{id}/stock - signed delta, at most ±1,000,000 per call
pub async fn adjust_stock(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<StockAdjustment>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state.catalog.adjust_stock(&id, payload.quantity).await?;
    Ok(Json(ApiResponse::success(product)))
}
