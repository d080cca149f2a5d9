//! API DTOs (Data Transfer Objects)
//!
//! Money crosses the wire as a JSON number with at most two fractional
//! digits; internally it stays exact decimal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entity::balance::Balance;
use crate::domain::entity::order::Order;
use crate::domain::entity::withdrawal::Withdrawal;
use crate::domain::value_object::order_status::OrderStatus;

// ============================================================================
// Register / Login
// ============================================================================

/// Registration and login request
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

// ============================================================================
// Orders
// ============================================================================

/// Uploaded order as listed to its owner
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: OrderStatus,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let accrual = (!order.accrual.is_zero()).then(|| order.accrual.amount());
        Self {
            number: order.number.into_string(),
            status: order.status,
            accrual,
            uploaded_at: order.uploaded_at,
        }
    }
}

// ============================================================================
// Balance
// ============================================================================

/// Balance snapshot
#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub withdrawn: Decimal,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self {
            current: balance.current.amount(),
            withdrawn: balance.withdrawn.amount(),
        }
    }
}

// ============================================================================
// Withdrawals
// ============================================================================

/// Withdrawal request
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
}

/// Completed withdrawal as listed to its owner
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(withdrawal: Withdrawal) -> Self {
        Self {
            order: withdrawal.order_number,
            sum: withdrawal.sum.amount(),
            processed_at: withdrawal.processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::order::Order;
    use crate::domain::value_object::order_number::OrderNumber;
    use crate::domain::value_object::points::Points;
    use crate::domain::value_object::user_id::UserId;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_order_without_accrual_omits_the_field() {
        let order = Order::accepted(UserId::new(), OrderNumber::parse("125").unwrap());
        let value = serde_json::to_value(OrderResponse::from(order)).unwrap();

        assert_eq!(value["number"], "125");
        assert_eq!(value["status"], "NEW");
        assert!(value.get("accrual").is_none());
    }

    #[test]
    fn test_processed_order_carries_accrual_as_number() {
        let order = Order::with_status(
            UserId::new(),
            OrderNumber::parse("125").unwrap(),
            OrderStatus::Processed,
            Points::new(dec("42.00")).unwrap(),
        );
        let value = serde_json::to_value(OrderResponse::from(order)).unwrap();

        assert_eq!(value["status"], "PROCESSED");
        assert_eq!(value["accrual"], serde_json::json!(42.0));
    }

    #[test]
    fn test_balance_serializes_as_numbers() {
        let response = BalanceResponse {
            current: dec("500.5"),
            withdrawn: dec("42"),
        };
        let value = serde_json::to_value(response).unwrap();

        assert_eq!(value, serde_json::json!({"current": 500.5, "withdrawn": 42.0}));
    }

    #[test]
    fn test_withdraw_request_accepts_json_numbers() {
        let request: WithdrawRequest =
            serde_json::from_str(r#"{"order":"2377225624","sum":751.0}"#).unwrap();
        assert_eq!(request.order, "2377225624");
        assert_eq!(request.sum, dec("751"));
    }

    #[test]
    fn test_timestamps_are_rfc3339() {
        let order = Order::accepted(UserId::new(), OrderNumber::parse("125").unwrap());
        let value = serde_json::to_value(OrderResponse::from(order)).unwrap();
        let uploaded_at = value["uploaded_at"].as_str().unwrap();
        assert!(uploaded_at.contains('T'));
    }
}
