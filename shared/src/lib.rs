//! Shared types for the shop backend
//!
//! Wire-level types used by the server and its clients: the unified error
//! system, entity models with their request payloads, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
