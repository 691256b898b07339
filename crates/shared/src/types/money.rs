//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal` in soles, rounded to cents.

use rust_decimal::{Decimal, RoundingStrategy};

/// ISO 4217 code of the only currency the shop works in.
pub const CURRENCY: &str = "PEN";

/// Rounds an amount to cents, half away from zero.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds an amount to whole currency units, half away from zero.
#[must_use]
pub fn round0(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// True when the amount has no digits below the cent.
///
/// Trailing zeros do not count, so `1.500` is whole cents.
#[must_use]
pub fn is_cents(amount: Decimal) -> bool {
    amount.normalize().scale() <= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(33.333333)), dec!(33.33));
    }

    #[test]
    fn test_round2_keeps_exact_cents() {
        assert_eq!(round2(dec!(100.10)), dec!(100.10));
        assert_eq!(round2(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_round0() {
        assert_eq!(round0(dec!(1.5)), dec!(2));
        assert_eq!(round0(dec!(1.49)), dec!(1));
        assert_eq!(round0(dec!(150.50)), dec!(151));
    }

    #[test]
    fn test_is_cents() {
        assert!(is_cents(dec!(100)));
        assert!(is_cents(dec!(0.01)));
        assert!(is_cents(dec!(1.500)));
        assert!(!is_cents(dec!(0.005)));
        assert!(!is_cents(dec!(10.001)));
    }
}
