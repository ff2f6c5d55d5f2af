//! Authentication and authorization
//!
//! - [`JwtService`]: access and refresh credentials
//! - [`CurrentUser`]: the authenticated caller
//! - [`require_auth`] / [`require_admin`] / [`optional_auth`]: middleware
//! - [`RateLimiter`]: per-IP request limiting

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rate_limit;

pub use extractor::MaybeUser;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, TokenType};
pub use middleware::{optional_auth, require_admin, require_auth};
pub use rate_limit::{RateLimiter, global_rate_limit, login_rate_limit};
