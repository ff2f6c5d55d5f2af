//! Shop server
//!
//! HTTP backend for a small online shop: product catalog and search, carts,
//! checkout with stock reservation and discount codes, the order lifecycle,
//! accounts and image uploads.
//!
//! # Modules
//!
//! - [`core`]: configuration and shared state
//! - [`db`]: SQLite pool, migrations and repositories
//! - [`services`]: business logic
//! - [`auth`]: credentials, middleware and rate limiting
//! - [`api`]: HTTP routers and handlers
//! - [`utils`]: logging and validation helpers

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use crate::core::{Config, ServerState};

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Build the application with all routes, middleware and state
///
/// Used by the HTTP server and by integration tests.
pub fn build_app(state: ServerState) -> Router {
    let api = api::router(&state).layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth::global_rate_limit,
    ));

    Router::new()
        .nest(&state.config.api_prefix(), api)
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
