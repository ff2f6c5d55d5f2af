//! Order API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /orders | POST | optional, caller attached when present |
//! | /orders/number/{number} | GET | none |
//! | /orders/me | GET | required |
//! | /orders/{id} | GET | owner or admin |
//! | /orders | GET | admin |
//! | /orders/{id}/status | PATCH | admin |
//! | /orders/{id}/payment | PATCH | admin |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::{optional_auth, require_admin, require_auth};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest(
        "/orders",
        public_routes(state)
            .merge(customer_routes(state))
            .merge(admin_routes(state)),
    )
}

fn public_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route(
            "/",
            post(handler::create).route_layer(middleware::from_fn_with_state(
                state.clone(),
                optional_auth,
            )),
        )
        .route("/number/{number}", get(handler::get_by_number))
}

fn customer_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/me", get(handler::my_orders))
        .route("/{id}", get(handler::get_by_id))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn admin_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_all))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/payment", patch(handler::update_payment))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
