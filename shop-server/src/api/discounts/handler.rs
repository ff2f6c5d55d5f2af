//! Discount code API Handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use http::StatusCode;
use shared::models::{
    DiscountCode, DiscountCodeCreate, DiscountCodeListResponse, DiscountCodeUpdate,
    DiscountValidateRequest, DiscountValidation, PageQuery,
};
use shared::{ApiResponse, AppResult};

use crate::api::extract::{ValidJson, pagination};
use crate::core::ServerState;

/// POST /discounts/validate - check a code against a purchase total
///
/// An unusable code is still a 200; `valid` and `message` say why.
pub async fn validate(
    State(state): State<ServerState>,
    ValidJson(req): ValidJson<DiscountValidateRequest>,
) -> AppResult<Json<ApiResponse<DiscountValidation>>> {
    let result = state
        .discounts
        .validate(&req.code, req.purchase_total)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// GET /discounts
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<DiscountCodeListResponse>>> {
    let codes = state.discounts.list(pagination(query)).await?;
    Ok(Json(ApiResponse::success(codes)))
}

/// POST /discounts
pub async fn create(
    State(state): State<ServerState>,
    ValidJson(payload): ValidJson<DiscountCodeCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<DiscountCode>>)> {
    let code = state.discounts.create(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(code))))
}

/// GET /discounts/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<DiscountCode>>> {
    let code = state.discounts.get(&id).await?;
    Ok(Json(ApiResponse::success(code)))
}

/// PUT /discounts/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<DiscountCodeUpdate>,
) -> AppResult<Json<ApiResponse<DiscountCode>>> {
    let code = state.discounts.update(&id, payload).await?;
    Ok(Json(ApiResponse::success(code)))
}

/// DELETE /discounts/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.discounts.delete(&id).await?;
    Ok(Json(ApiResponse::ok()))
}
