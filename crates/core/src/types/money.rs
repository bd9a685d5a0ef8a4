//! Money helpers over [`rust_decimal::Decimal`].
//!
//! Prices and totals are stored as `NUMERIC(10,2)` and handled as `Decimal`
//! end to end. These helpers cover the two conversions the shop needs:
//! display formatting and minor units for the payment processor.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Errors converting an amount to minor units.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Negative amounts cannot be charged.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in an `i64` number of cents.
    #[error("amount is too large: {0}")]
    Overflow(Decimal),
}

/// Convert a major-unit amount into minor units (cents), truncating any
/// fraction of a cent.
///
/// # Errors
///
/// Returns [`MoneyError`] for negative or unrepresentable amounts.
///
/// ```
/// use crumb_core::to_minor_units;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_minor_units(Decimal::new(5000, 2)).unwrap(), 5000);
/// assert_eq!(to_minor_units(Decimal::new(19999, 3)).unwrap(), 1999);
/// ```
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.trunc())
        .and_then(|cents| cents.to_i64())
        .ok_or(MoneyError::Overflow(amount))
}

/// Format an amount for display with two decimals and a dollar sign.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_truncates() {
        assert_eq!(to_minor_units(Decimal::new(2500, 2)).unwrap(), 2500);
        assert_eq!(to_minor_units(Decimal::new(12_345, 3)).unwrap(), 1234);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_minor_units_rejects_negative() {
        assert!(matches!(
            to_minor_units(Decimal::new(-1, 2)),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_minor_units_overflow() {
        assert!(matches!(
            to_minor_units(Decimal::MAX),
            Err(MoneyError::Overflow(_))
        ));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(5000, 2)), "$50.00");
        assert_eq!(format_money(Decimal::new(7, 0)), "$7.00");
        assert_eq!(format_money(Decimal::new(1999, 2)), "$19.99");
    }
}
