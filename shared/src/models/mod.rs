//! Data models
//!
//! Shared between the server and its clients (via API).
//! All IDs are UUID v4 strings; timestamps are Unix millis.

pub mod cart;
pub mod discount;
pub mod order;
pub mod page;
pub mod product;
pub mod user;

// Re-exports
pub use cart::*;
pub use discount::*;
pub use order::*;
pub use page::*;
pub use product::*;
pub use user::*;
