//! Monetary amounts in Chilean pesos with es-CL display formatting.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in Chilean pesos.
///
/// Wraps a [`Decimal`] so arithmetic never touches floating point. `Display`
/// renders the storefront format: `$` prefix with dot-separated thousands
/// ("$12.000"). Peso amounts are whole numbers in practice; a fractional
/// part, when one survives normalization, renders after a comma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero pesos.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create an amount from a raw decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a unit count (line subtotals).
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Difference, saturating at zero. Savings never display as negative.
    #[must_use]
    pub fn saturating_sub(&self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::zero()
        } else {
            Self(self.0 - other.0)
        }
    }

    /// True when the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<i64> for Money {
    fn from(pesos: i64) -> Self {
        Self(Decimal::from(pesos))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.0.normalize();
        let digits = normalized.abs().to_string();
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits.as_str(), None),
        };

        if normalized.is_sign_negative() && !normalized.is_zero() {
            write!(f, "-")?;
        }
        write!(f, "$")?;

        let chars: Vec<char> = int_part.chars().collect();
        for (position, ch) in chars.iter().enumerate() {
            if position > 0 && (chars.len() - position) % 3 == 0 {
                write!(f, ".")?;
            }
            write!(f, "{ch}")?;
        }

        if let Some(frac_part) = frac_part {
            write!(f, ",{frac_part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_display_groups_thousands_with_dots() {
        assert_eq!(Money::from(0).to_string(), "$0");
        assert_eq!(Money::from(999).to_string(), "$999");
        assert_eq!(Money::from(1_000).to_string(), "$1.000");
        assert_eq!(Money::from(15_000).to_string(), "$15.000");
        assert_eq!(Money::from(1_234_567).to_string(), "$1.234.567");
    }

    #[test]
    fn test_display_drops_insignificant_decimals() {
        let amount = Money::new(Decimal::new(12_000_00, 2)); // 12000.00
        assert_eq!(amount.to_string(), "$12.000");
    }

    #[test]
    fn test_display_keeps_significant_decimals_after_comma() {
        let amount = Money::new(Decimal::new(1_234_50, 2)); // 1234.50
        assert_eq!(amount.to_string(), "$1.234,5");
    }

    #[test]
    fn test_times_scales_by_quantity() {
        assert_eq!(Money::from(5_000).times(3), Money::from(15_000));
        assert_eq!(Money::from(5_000).times(0), Money::zero());
    }

    #[test]
    fn test_saturating_sub_never_goes_negative() {
        assert_eq!(
            Money::from(15_000).saturating_sub(Money::from(12_000)),
            Money::from(3_000)
        );
        assert_eq!(
            Money::from(12_000).saturating_sub(Money::from(15_000)),
            Money::zero()
        );
    }

    #[test]
    fn test_sum_over_line_subtotals() {
        let total: Money = [Money::from(10_000), Money::from(3_000)].into_iter().sum();
        assert_eq!(total, Money::from(13_000));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Money::from(15_000)).unwrap();
        assert_eq!(json, "\"15000\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from(15_000));
    }
}
