//! Order Number Value Object
//!
//! Client-supplied decimal string identifying an order globally. Leading
//! zeros are significant, so the number is kept as a string and never
//! parsed into an integer.

use std::fmt;

use thiserror::Error;

/// Order number validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    /// Empty, or contains a non-digit character
    #[error("Order number must be a non-empty decimal digit string")]
    NotNumeric,

    /// Digits fail the Luhn mod-10 checksum
    #[error("Order number fails the Luhn checksum")]
    Checksum,
}

/// A Luhn-valid order number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Validate and wrap a raw order number.
    pub fn parse(raw: &str) -> Result<Self, OrderNumberError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::NotNumeric);
        }
        if !luhn_valid(raw) {
            return Err(OrderNumberError::Checksum);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Luhn mod-10 check over a digit string.
///
/// Every second digit from the right is doubled, subtracting 9 when the
/// doubled digit exceeds 9; the total must be divisible by 10.
fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, b) in digits.bytes().rev().enumerate() {
        let mut d = u32::from(b - b'0');
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers() {
        assert!(OrderNumber::parse("0").is_ok());
        assert!(OrderNumber::parse("125").is_ok());
        assert!(OrderNumber::parse("42").is_ok());
        assert!(OrderNumber::parse("79927398713").is_ok());
    }

    #[test]
    fn test_checksum_failures() {
        assert_eq!(OrderNumber::parse("12"), Err(OrderNumberError::Checksum));
        assert_eq!(OrderNumber::parse("126"), Err(OrderNumberError::Checksum));
    }

    #[test]
    fn test_non_numeric_input() {
        assert_eq!(OrderNumber::parse(""), Err(OrderNumberError::NotNumeric));
        assert_eq!(OrderNumber::parse("12a"), Err(OrderNumberError::NotNumeric));
        assert_eq!(OrderNumber::parse("12 5"), Err(OrderNumberError::NotNumeric));
        assert_eq!(OrderNumber::parse("-125"), Err(OrderNumberError::NotNumeric));
    }

    #[test]
    fn test_leading_zeros_survive() {
        let number = OrderNumber::parse("0042").unwrap();
        assert_eq!(number.as_str(), "0042");
    }
}
