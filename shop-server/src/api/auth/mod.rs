//! Auth API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /auth/register | POST | none |
//! | /auth/login | POST | none, login rate limit |
//! | /auth/refresh | POST | none |

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::login_rate_limit;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest("/auth", auth_routes(state))
}

fn auth_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/register", post(handler::register))
        .route(
            "/login",
            post(handler::login).route_layer(middleware::from_fn_with_state(
                state.clone(),
                login_rate_limit,
            )),
        )
        .route("/refresh", post(handler::refresh))
}
