//! Upload API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /uploads | POST | admin, multipart field `file` |
//! | /uploads/{filename} | GET | none |

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::auth::{require_admin, require_auth};
use crate::core::ServerState;
use crate::services::upload::MAX_FILE_SIZE;

/// Room for the multipart envelope around a maximum-size file
const BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let upload = Router::new()
        .route("/", post(handler::upload))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new().nest(
        "/uploads",
        Router::new()
            .route("/{filename}", get(handler::serve))
            .merge(upload),
    )
}
