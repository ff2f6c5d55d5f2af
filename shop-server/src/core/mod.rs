//! Core module: configuration and shared state
//!
//! - [`Config`]: environment-driven configuration
//! - [`ServerState`]: services and limiters shared by every handler

pub mod config;
pub mod state;

pub use config::Config;
pub use state::ServerState;
