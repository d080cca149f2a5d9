//! Upload Order Use Case
//!
//! Accepts a new order number for accrual. The provider is probed
//! synchronously once; any provider failure degrades to a `NEW` order and
//! the reconciliation pipeline converges it later.

use std::sync::Arc;

use crate::domain::entity::order::Order;
use crate::domain::repository::LedgerRepository;
use crate::domain::value_object::order_number::OrderNumber;
use crate::domain::value_object::user_id::UserId;
use crate::error::{LoyaltyError, LoyaltyResult};
use crate::infra::accrual::{AccrualClient, AccrualReply};

/// What happened to the uploaded number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Accepted for processing (202)
    Accepted,
    /// The same user uploaded this number before (200)
    AlreadyUploaded,
}

/// Upload order use case
pub struct UploadOrderUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
    accrual: Arc<AccrualClient>,
}

impl<R> UploadOrderUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>, accrual: Arc<AccrualClient>) -> Self {
        Self { repo, accrual }
    }

    pub async fn execute(&self, user_id: UserId, raw_number: &str) -> LoyaltyResult<UploadOutcome> {
        let number = OrderNumber::parse(raw_number)?;

        if self.repo.get_order(user_id, number.as_str()).await?.is_some() {
            return Ok(UploadOutcome::AlreadyUploaded);
        }

        let order = self.probe_provider(user_id, number.clone()).await;

        match self.repo.add_order(&order).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, order = %number, status = %order.status, "Order uploaded");
                Ok(UploadOutcome::Accepted)
            }
            Err(LoyaltyError::DuplicateOrder) => {
                // Lost a race on the unique constraint. A row visible for
                // this user means the duplicate was ours.
                if self.repo.get_order(user_id, number.as_str()).await?.is_some() {
                    Ok(UploadOutcome::AlreadyUploaded)
                } else {
                    Err(LoyaltyError::OrderOwnedByAnother)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// One synchronous provider probe; every failure path falls back to a
    /// plain NEW order.
    async fn probe_provider(&self, user_id: UserId, number: OrderNumber) -> Order {
        let reply = self.accrual.order_status(number.as_str()).await;
        match reply {
            Ok(AccrualReply::Found(provider)) => match provider.accrual_points() {
                Ok(accrual) => {
                    Order::with_status(user_id, number, provider.order_status(), accrual)
                }
                Err(err) => {
                    tracing::warn!(order = %number, error = %err, "Rejecting provider accrual, creating NEW order");
                    Order::accepted(user_id, number)
                }
            },
            Ok(AccrualReply::NoContent) | Ok(AccrualReply::RateLimited(_)) => {
                Order::accepted(user_id, number)
            }
            Err(err) => {
                tracing::info!(order = %number, error = %err, "Provider unavailable, creating NEW order");
                Order::accepted(user_id, number)
            }
        }
    }
}
