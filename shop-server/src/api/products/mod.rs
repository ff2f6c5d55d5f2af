//! Product API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /products | GET | none |
//! | /products/search?q=&limit= | GET | none |
//! | /products/featured | GET | none |
//! | /products/{id} | GET | none |
//! | /products | POST | admin |
//! | /products/{id} | PUT | admin |
//! | /products/{id}/stock | PATCH | admin |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::{require_admin, require_auth};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest("/products", public_routes().merge(admin_routes(state)))
}

fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/search", get(handler::search))
        .route("/featured", get(handler::featured))
        .route("/{id}", get(handler::get_by_id))
}

fn admin_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update))
        .route("/{id}/stock", patch(handler::adjust_stock))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
