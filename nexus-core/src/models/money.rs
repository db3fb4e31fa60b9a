//! Decimal helpers for currency fields.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half away from zero to two places.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render with exactly two decimals, e.g. `5000` -> `"5000.00"`.
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round2(value);
    rounded.rescale(2);
    rounded.to_string()
}

/// Render without trailing zeros, e.g. `1.00` -> `"1"`, `2.50` -> `"2.5"`.
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Percentage of an amount, rounded to two places.
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    round2(amount * rate / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_always_have_two_decimals() {
        assert_eq!(format_amount(Decimal::new(5000, 0)), "5000.00");
        assert_eq!(format_amount(Decimal::new(12345, 3)), "12.35");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(Decimal::new(-15, 1)), "-1.50");
    }

    #[test]
    fn quantities_drop_trailing_zeros() {
        assert_eq!(format_quantity(Decimal::new(100, 2)), "1");
        assert_eq!(format_quantity(Decimal::new(250, 2)), "2.5");
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(percent_of(Decimal::new(5000, 0), Decimal::new(18, 0)), Decimal::new(900, 0));
        assert_eq!(percent_of(Decimal::new(1, 1), Decimal::new(25, 0)), Decimal::new(3, 2));
    }
}
