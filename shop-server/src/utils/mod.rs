//! Utilities: logging setup and payload validation

pub mod logger;
pub mod validation;

pub use logger::init_logger;
pub use validation::validate_payload;
