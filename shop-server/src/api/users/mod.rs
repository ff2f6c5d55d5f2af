//! Users API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /users/me | GET | required |
//! | /users/me | PUT | required |

use axum::{Json, Router, extract::State, middleware, routing::get};
use shared::models::{UpdateProfileRequest, UserResponse};
use shared::{ApiResponse, AppResult};

use crate::api::extract::ValidJson;
use crate::auth::{CurrentUser, require_auth};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/users/me", get(me).put(update_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// GET /users/me
async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let profile = state.accounts.me(&user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /users/me - name and/or phone
async fn update_me(
    State(state): State<ServerState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let profile = state.accounts.update_profile(&user.id, payload).await?;
    Ok(Json(ApiResponse::success(profile)))
}
