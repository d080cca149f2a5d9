//! Withdrawal Entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::value_object::order_number::OrderNumber;
use crate::domain::value_object::points::Points;
use crate::domain::value_object::user_id::UserId;
use crate::domain::value_object::withdrawal_id::WithdrawalId;

/// State of a withdrawal request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Pending,
    Success,
    Failure,
}

#[derive(Debug, Clone, Error)]
#[error("Unknown withdrawal status: {0}")]
pub struct ParseWithdrawalStatusError(String);

impl WithdrawalStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "PENDING",
            WithdrawalStatus::Success => "SUCCESS",
            WithdrawalStatus::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = ParseWithdrawalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(WithdrawalStatus::Pending),
            "SUCCESS" => Ok(WithdrawalStatus::Success),
            "FAILURE" => Ok(WithdrawalStatus::Failure),
            other => Err(ParseWithdrawalStatusError(other.to_owned())),
        }
    }
}

/// Withdrawal of points against a new order
///
/// Transitions to `Success` inside the same transaction that debits the
/// balance.
#[derive(Debug, Clone)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub user_id: UserId,
    pub order_number: String,
    pub sum: Points,
    pub status: WithdrawalStatus,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Withdrawal {
    /// A new withdrawal awaiting the balance debit.
    pub fn pending(user_id: UserId, order_number: OrderNumber, sum: Points) -> Self {
        Self {
            id: WithdrawalId::new(),
            user_id,
            order_number: order_number.into_string(),
            sum,
            status: WithdrawalStatus::Pending,
            processed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            WithdrawalStatus::Pending,
            WithdrawalStatus::Success,
            WithdrawalStatus::Failure,
        ] {
            assert_eq!(status.as_str().parse::<WithdrawalStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_pending_withdrawal_has_no_processed_at() {
        let sum = Points::new(Decimal::new(500, 2)).unwrap();
        let withdrawal =
            Withdrawal::pending(UserId::new(), OrderNumber::parse("125").unwrap(), sum);
        assert_eq!(withdrawal.status, WithdrawalStatus::Pending);
        assert!(withdrawal.processed_at.is_none());
    }
}
