//! Statement Use Case
//!
//! Thin reads over the ledger for the authenticated user.

use std::sync::Arc;

use crate::domain::entity::balance::Balance;
use crate::domain::entity::order::Order;
use crate::domain::entity::withdrawal::Withdrawal;
use crate::domain::repository::LedgerRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::LoyaltyResult;

/// Statement use case
pub struct StatementsUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
}

impl<R> StatementsUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Uploaded orders, oldest first.
    pub async fn orders(&self, user_id: UserId) -> LoyaltyResult<Vec<Order>> {
        self.repo.get_orders(user_id).await
    }

    /// Current and withdrawn point totals.
    pub async fn balance(&self, user_id: UserId) -> LoyaltyResult<Balance> {
        self.repo.get_balance(user_id).await
    }

    /// Completed withdrawals, oldest first.
    pub async fn withdrawals(&self, user_id: UserId) -> LoyaltyResult<Vec<Withdrawal>> {
        self.repo.get_withdrawals(user_id).await
    }
}
