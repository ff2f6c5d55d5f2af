//! API routes
//!
//! - [`health`]: liveness
//! - [`auth`]: register, login, refresh
//! - [`users`]: the current account
//! - [`products`]: catalog, search and stock
//! - [`cart`]: the current account's cart
//! - [`orders`]: checkout and the order lifecycle
//! - [`discounts`]: discount codes
//! - [`upload`]: product images

pub mod extract;

pub mod auth;
pub mod cart;
pub mod discounts;
pub mod health;
pub mod orders;
pub mod products;
pub mod upload;
pub mod users;

use axum::Router;

use crate::core::ServerState;

/// All API routes, relative to `/api/{version}`
pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(users::router(state))
        .merge(products::router(state))
        .merge(cart::router(state))
        .merge(orders::router(state))
        .merge(discounts::router(state))
        .merge(upload::router(state))
}
