//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use http::StatusCode;
use shared::models::{
    Order, OrderCreate, OrderListResponse, OrderStatusUpdate, OrderWithItems, PageQuery,
    PaymentStatusUpdate,
};
use shared::{ApiResponse, AppError, AppResult};

use crate::api::extract::{JsonBody, ValidJson, pagination};
use crate::auth::{CurrentUser, MaybeUser};
use crate::core::ServerState;

/// POST /orders - checkout
pub async fn create(
    State(state): State<ServerState>,
    MaybeUser(user): MaybeUser,
    ValidJson(payload): ValidJson<OrderCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let order = state
        .orders
        .create_order(payload, user.map(|u| u.id))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("Order created", order)),
    ))
}

/// GET /orders/number/{number}
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let order = state.orders.get_by_number(&number).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /orders/me
pub async fn my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderListResponse>>> {
    let orders = state
        .orders
        .user_orders(&user.id, pagination(query))
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /orders/{id} - visible to its owner and to admins
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let order = state.orders.get_by_id(&id).await?;
    let is_owner = order.order.user_id.as_deref() == Some(user.id.as_str());
    if !is_owner && !user.is_admin() {
        return Err(AppError::permission_denied(
            "You do not have access to this order",
        ));
    }
    Ok(Json(ApiResponse::success(order)))
}

/// GET /orders
pub async fn list_all(
    State(state): State<ServerState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderListResponse>>> {
    let orders = state.orders.all_orders(pagination(query)).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// PATCH /orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<OrderStatusUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.state_machine.update_status(&id, payload.status).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// PATCH /orders/{id}/payment
pub async fn update_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<PaymentStatusUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .state_machine
        .update_payment_status(&id, payload)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}
