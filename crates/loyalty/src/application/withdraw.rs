//! Withdraw Use Case
//!
//! Spends points against a new order number. The debit itself is the
//! ledger's single-transaction algorithm; this layer only validates input.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::repository::LedgerRepository;
use crate::domain::value_object::order_number::OrderNumber;
use crate::domain::value_object::points::Points;
use crate::domain::value_object::user_id::UserId;
use crate::error::{LoyaltyError, LoyaltyResult};

/// Withdraw input
pub struct WithdrawInput {
    pub order: String,
    pub sum: Decimal,
}

/// Withdraw use case
pub struct WithdrawUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
}

impl<R> WithdrawUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: UserId, input: WithdrawInput) -> LoyaltyResult<()> {
        // The withdraw surface has no 400; every bad order string is 422.
        let number = OrderNumber::parse(&input.order)
            .map_err(|_| LoyaltyError::OrderNumberChecksum)?;

        let sum = Points::new(input.sum).map_err(|_| LoyaltyError::NonPositiveWithdrawal)?;
        if !sum.is_positive() {
            return Err(LoyaltyError::NonPositiveWithdrawal);
        }

        self.repo.withdrawal_request(user_id, &number, sum).await?;

        tracing::info!(user_id = %user_id, order = %number, sum = %sum, "Withdrawal completed");

        Ok(())
    }
}
