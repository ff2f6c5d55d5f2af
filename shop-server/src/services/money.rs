//! Monetary arithmetic
//!
//! Amounts are stored and serialized as `f64`; every calculation goes
//! through `Decimal` and is rounded back to two places.

use rust_decimal::prelude::*;

const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64, rounded half away from zero
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `unit_price × quantity`, saturating at `Decimal::MAX`
pub fn line_subtotal(unit_price: f64, quantity: i64) -> Decimal {
    to_decimal(unit_price)
        .checked_mul(Decimal::from(quantity))
        .unwrap_or_else(|| {
            tracing::error!(unit_price, quantity, "Line subtotal overflow, saturating");
            Decimal::MAX
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_subtotal_avoids_float_drift() {
        assert_eq!(to_f64(line_subtotal(0.1, 3)), 0.3);
        assert_eq!(to_f64(line_subtotal(25000.0, 2)), 50000.0);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(to_f64(Decimal::new(1005, 3)), 1.01);
        assert_eq!(to_f64(Decimal::new(-1005, 3)), -1.01);
    }

    #[test]
    fn test_line_subtotal_saturates() {
        assert_eq!(line_subtotal(1e28, 1_000_000), Decimal::MAX);
    }

    #[test]
    fn test_non_finite_is_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }
}
