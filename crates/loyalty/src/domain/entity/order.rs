//! Order Entity

use chrono::{DateTime, Utc};

use crate::domain::value_object::order_id::OrderId;
use crate::domain::value_object::order_number::OrderNumber;
use crate::domain::value_object::order_status::OrderStatus;
use crate::domain::value_object::points::Points;
use crate::domain::value_object::user_id::UserId;

/// Uploaded purchase order
///
/// Created on upload; only reconciliation mutates status and accrual.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub number: OrderNumber,
    pub status: OrderStatus,
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A freshly accepted order the provider has not confirmed yet.
    pub fn accepted(user_id: UserId, number: OrderNumber) -> Self {
        Self::with_status(user_id, number, OrderStatus::New, Points::ZERO)
    }

    /// An order created straight from the provider's first answer.
    pub fn with_status(
        user_id: UserId,
        number: OrderNumber,
        status: OrderStatus,
        accrual: Points,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            number,
            status,
            accrual,
            uploaded_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Not-yet-terminal order emitted by the scanner towards the worker pool.
#[derive(Debug, Clone)]
pub struct PendingOrder {
    pub user_id: UserId,
    pub number: String,
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_order_is_new_with_zero_accrual() {
        let order = Order::accepted(UserId::new(), OrderNumber::parse("125").unwrap());
        assert_eq!(order.status, OrderStatus::New);
        assert!(order.accrual.is_zero());
        assert!(!order.is_terminal());
    }
}
