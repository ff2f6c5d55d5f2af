//! Cart API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /cart | GET | required |
//! | /cart | DELETE | required |
//! | /cart/items | POST | required |
//! | /cart/items/{product_id} | PUT | required |
//! | /cart/items/{product_id} | DELETE | required |
//! | /cart/sync | POST | required |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_auth;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest(
        "/cart",
        Router::new()
            .route("/", get(handler::get).delete(handler::clear))
            .route("/items", post(handler::add_item))
            .route(
                "/items/{product_id}",
                put(handler::update_item).delete(handler::remove_item),
            )
            .route("/sync", post(handler::sync))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
    )
}
