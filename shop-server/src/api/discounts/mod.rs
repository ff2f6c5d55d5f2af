//! Discount code API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /discounts/validate | POST | none |
//! | /discounts | GET, POST | admin |
//! | /discounts/{id} | GET, PUT, DELETE | admin |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{require_admin, require_auth};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let admin = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new().nest(
        "/discounts",
        Router::new()
            .route("/validate", post(handler::validate))
            .merge(admin),
    )
}
