//! Human-readable order numbers
//!
//! Format: `CHEOS-YYYYMMDD-NNNNNN` with six random digits. Uniqueness is
//! best-effort; collisions are not checked against stored orders.

use chrono::{DateTime, Utc};
use rand::Rng;

pub const ORDER_NUMBER_PREFIX: &str = "CHEOS";

pub fn generate() -> String {
    generate_at(Utc::now())
}

pub fn generate_at(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!(
        "{}-{}-{:06}",
        ORDER_NUMBER_PREFIX,
        now.format("%Y%m%d"),
        suffix
    )
}
