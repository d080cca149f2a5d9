//! Repository Traits
//!
//! Interface for the transactional ledger. Implementation is in the
//! infrastructure layer; the invariants linking orders, balances and
//! withdrawals are its responsibility.

use crate::domain::entity::balance::Balance;
use crate::domain::entity::order::Order;
use crate::domain::entity::user::User;
use crate::domain::entity::withdrawal::Withdrawal;
use crate::domain::value_object::order_number::OrderNumber;
use crate::domain::value_object::order_status::OrderStatus;
use crate::domain::value_object::points::Points;
use crate::domain::value_object::user_id::UserId;
use crate::error::LoyaltyResult;

/// Ledger repository trait
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    /// Create the user and their zeroed balance rows in one transaction.
    ///
    /// Fails with `DuplicateLogin` when the login is taken.
    async fn add_user(&self, login: &str, password_digest: &str) -> LoyaltyResult<User>;

    /// Find the user matching the login/digest pair.
    async fn get_user(&self, login: &str, password_digest: &str) -> LoyaltyResult<Option<User>>;

    /// Insert an order; credit the balance when it arrives already PROCESSED.
    ///
    /// Fails with `DuplicateOrder` when the number exists for any user.
    async fn add_order(&self, order: &Order) -> LoyaltyResult<()>;

    /// Update status/accrual; credit the balance exactly once, on the
    /// transition into PROCESSED. Terminal rows are left untouched.
    async fn update_order(
        &self,
        user_id: UserId,
        number: &str,
        status: OrderStatus,
        accrual: Points,
    ) -> LoyaltyResult<()>;

    /// Find an order scoped to its owner.
    async fn get_order(&self, user_id: UserId, number: &str) -> LoyaltyResult<Option<Order>>;

    /// All orders of a user, oldest upload first.
    async fn get_orders(&self, user_id: UserId) -> LoyaltyResult<Vec<Order>>;

    /// Debit the balance and record the withdrawal in one transaction,
    /// holding a row lock on the balance.
    ///
    /// Fails with `InsufficientBalance` without leaving a SUCCESS row.
    async fn withdrawal_request(
        &self,
        user_id: UserId,
        order_number: &OrderNumber,
        sum: Points,
    ) -> LoyaltyResult<()>;

    /// Current and withdrawn totals.
    async fn get_balance(&self, user_id: UserId) -> LoyaltyResult<Balance>;

    /// Completed withdrawals of a user, oldest first.
    async fn get_withdrawals(&self, user_id: UserId) -> LoyaltyResult<Vec<Withdrawal>>;
}
