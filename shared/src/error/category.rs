//! Error categories
//!
//! Codes are grouped in blocks of one thousand. The block tells which part
//! of the shop raised the error; only [`ErrorCategory::System`] failures are
//! the server's fault.

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 0xxx: request shape, lookups, throttling
    General,
    /// 1xxx: credentials and accounts
    Auth,
    /// 2xxx: role checks
    Permission,
    /// 3xxx: discount codes
    Discount,
    /// 4xxx: checkout and order lifecycle
    Order,
    /// 5xxx: image uploads
    Upload,
    /// 6xxx: catalog and stock
    Product,
    /// 7xxx: shopping carts
    Cart,
    /// 9xxx, plus any unassigned block
    System,
}

/// Category per thousand-block, indexed by `code / 1000`
const BLOCKS: [ErrorCategory; 8] = [
    ErrorCategory::General,
    ErrorCategory::Auth,
    ErrorCategory::Permission,
    ErrorCategory::Discount,
    ErrorCategory::Order,
    ErrorCategory::Upload,
    ErrorCategory::Product,
    ErrorCategory::Cart,
];

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        BLOCKS
            .get(usize::from(code / 1000))
            .copied()
            .unwrap_or(Self::System)
    }

    /// The client cannot fix this by changing the request
    pub fn is_server_fault(self) -> bool {
        self == Self::System
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Discount => "discount",
            Self::Order => "order",
            Self::Upload => "upload",
            Self::Product => "product",
            Self::Cart => "cart",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
