//! Points Value Object
//!
//! Fixed-scale non-negative money. Arithmetic is exact; binary floats only
//! ever appear at the API boundary.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

/// Points validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PointsError {
    #[error("Points cannot be negative")]
    Negative,
}

/// Non-negative point quantity at two-digit scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Points(Decimal);

impl Points {
    pub const ZERO: Points = Points(Decimal::ZERO);

    /// Validate and rescale to two fractional digits.
    pub fn new(amount: Decimal) -> Result<Self, PointsError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PointsError::Negative);
        }
        Ok(Self(amount.round_dp(2)))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Exact addition; `None` on overflow.
    pub fn checked_add(self, other: Points) -> Option<Points> {
        self.0.checked_add(other.0).map(Points)
    }

    /// Exact subtraction; `None` when the result would go negative.
    pub fn checked_sub(self, other: Points) -> Option<Points> {
        let result = self.0.checked_sub(other.0)?;
        if result.is_sign_negative() && !result.is_zero() {
            return None;
        }
        Some(Points(result))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_negative_is_rejected() {
        assert_eq!(Points::new(dec("-0.01")), Err(PointsError::Negative));
        assert!(Points::new(dec("0")).is_ok());
    }

    #[test]
    fn test_rescaled_to_two_digits() {
        let points = Points::new(dec("42.005")).unwrap();
        assert_eq!(points.amount(), dec("42.00"));
    }

    #[test]
    fn test_checked_sub_underflow() {
        let ten = Points::new(dec("10.00")).unwrap();
        let twenty = Points::new(dec("20.00")).unwrap();
        assert_eq!(ten.checked_sub(twenty), None);
        assert_eq!(twenty.checked_sub(ten), Some(ten));
    }

    #[test]
    fn test_exact_addition() {
        // 0.1 + 0.2 is exact here, unlike binary floats.
        let a = Points::new(dec("0.1")).unwrap();
        let b = Points::new(dec("0.2")).unwrap();
        assert_eq!(a.checked_add(b).unwrap().amount(), dec("0.3"));
    }

    #[test]
    fn test_predicates() {
        assert!(Points::ZERO.is_zero());
        assert!(!Points::ZERO.is_positive());
        assert!(Points::new(dec("1")).unwrap().is_positive());
    }
}
