//! Auth API Handlers

use axum::{Json, extract::State};
use http::StatusCode;
use shared::models::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, UserResponse,
};
use shared::{ApiResponse, AppResult};

use crate::api::extract::{JsonBody, ValidJson};
use crate::core::ServerState;

/// POST /auth/register
pub async fn register(
    State(state): State<ServerState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let user = state.accounts.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("User registered", user)),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<ServerState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let session = state.accounts.login(req).await?;
    Ok(Json(ApiResponse::success(session)))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<ServerState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> AppResult<Json<ApiResponse<RefreshResponse>>> {
    let refreshed = state.accounts.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::success(refreshed)))
}
