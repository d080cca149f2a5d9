//! PostgreSQL Ledger Implementation
//!
//! Single source of truth for the ledger invariants. Every mutating
//! operation runs inside one transaction; the withdrawal path takes a
//! `FOR UPDATE` row lock on the balance so concurrent debits and
//! reconciliation credits serialize on the same row.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entity::balance::Balance;
use crate::domain::entity::order::{Order, PendingOrder};
use crate::domain::entity::user::User;
use crate::domain::entity::withdrawal::{Withdrawal, WithdrawalStatus};
use crate::domain::repository::LedgerRepository;
use crate::domain::value_object::order_id::OrderId;
use crate::domain::value_object::order_number::OrderNumber;
use crate::domain::value_object::order_status::OrderStatus;
use crate::domain::value_object::points::Points;
use crate::domain::value_object::user_id::UserId;
use crate::domain::value_object::withdrawal_id::WithdrawalId;
use crate::error::{LoyaltyError, LoyaltyResult};

/// PostgreSQL-backed ledger repository
#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Spawn the periodic scanner for not-yet-terminal orders.
    ///
    /// Every `period` the scanner streams matching rows into the returned
    /// channel. The capacity-1 channel makes slow workers throttle the
    /// scan instead of buffering rows. Query errors are logged and the
    /// schedule continues; cancellation closes the channel.
    pub fn spawn_order_scanner(
        &self,
        period: Duration,
        shutdown: CancellationToken,
    ) -> mpsc::Receiver<PendingOrder> {
        let (tx, rx) = mpsc::channel(1);
        let pool = self.pool.clone();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut tick = tokio::time::interval_at(start, period);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tick.tick() => {
                        tracing::debug!("Scanning orders");
                        if !scan_once(&pool, &tx, &shutdown).await {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Order scanner stopped");
        });

        rx
    }
}

/// One scan pass. Returns `false` when the scanner should stop.
async fn scan_once(
    pool: &PgPool,
    tx: &mpsc::Sender<PendingOrder>,
    shutdown: &CancellationToken,
) -> bool {
    let mut rows = sqlx::query_as::<_, PendingOrderRow>(
        "SELECT order_number, status, user_id FROM orders WHERE status <> $1 AND status <> $2",
    )
    .bind(OrderStatus::Processed.as_str())
    .bind(OrderStatus::Invalid.as_str())
    .fetch(pool);

    loop {
        match rows.next().await {
            Some(Ok(row)) => {
                let pending = match row.into_pending() {
                    Ok(pending) => pending,
                    Err(err) => {
                        tracing::warn!(error = %err, "Skipping unreadable order row");
                        continue;
                    }
                };
                tokio::select! {
                    _ = shutdown.cancelled() => return false,
                    sent = tx.send(pending) => {
                        // A closed channel means the worker pool is gone.
                        if sent.is_err() {
                            return false;
                        }
                    }
                }
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Order scan failed");
                return true;
            }
            None => return true,
        }
    }
}

impl LedgerRepository for PgLedgerRepository {
    async fn add_user(&self, login: &str, password_digest: &str) -> LoyaltyResult<User> {
        let user = User::new(login, password_digest);

        let mut tx = self.pool.begin().await?;

        let inserted =
            sqlx::query("INSERT INTO users (id, login, password, created_at) VALUES ($1, $2, $3, $4)")
                .bind(user.id.as_uuid())
                .bind(&user.login)
                .bind(&user.password_digest)
                .bind(user.created_at)
                .execute(&mut *tx)
                .await;

        if let Err(err) = inserted {
            return Err(if is_unique_violation(&err) {
                LoyaltyError::DuplicateLogin
            } else {
                err.into()
            });
        }

        sqlx::query("INSERT INTO balances (user_id) VALUES ($1)")
            .bind(user.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO withdraw_balances (user_id) VALUES ($1)")
            .bind(user.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn get_user(&self, login: &str, password_digest: &str) -> LoyaltyResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, login, password, created_at FROM users WHERE login = $1 AND password = $2",
        )
        .bind(login)
        .bind(password_digest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn add_order(&self, order: &Order) -> LoyaltyResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, order_number, status, accrual, uploaded_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.number.as_str())
        .bind(order.status.as_str())
        .bind(order.accrual.amount())
        .bind(order.uploaded_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            return Err(if is_unique_violation(&err) {
                LoyaltyError::DuplicateOrder
            } else {
                err.into()
            });
        }

        // An order that arrives already PROCESSED carries its accrual.
        if order.status == OrderStatus::Processed {
            sqlx::query("UPDATE balances SET balance = balance + $1 WHERE user_id = $2")
                .bind(order.accrual.amount())
                .bind(order.user_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn update_order(
        &self,
        user_id: UserId,
        number: &str,
        status: OrderStatus,
        accrual: Points,
    ) -> LoyaltyResult<()> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<String> = sqlx::query_scalar(
            "SELECT status FROM orders WHERE user_id = $1 AND order_number = $2 FOR UPDATE",
        )
        .bind(user_id.as_uuid())
        .bind(number)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous) = previous else {
            // Rows are never deleted; a miss can only be a stale scan item.
            return Ok(());
        };
        let previous: OrderStatus = previous
            .parse()
            .map_err(|err: crate::domain::value_object::order_status::ParseOrderStatusError| {
                LoyaltyError::Internal(err.to_string())
            })?;

        // Terminal states never change.
        if previous.is_terminal() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE orders SET status = $1, accrual = $2, updated_at = $3
            WHERE user_id = $4 AND order_number = $5
            "#,
        )
        .bind(status.as_str())
        .bind(accrual.amount())
        .bind(Utc::now())
        .bind(user_id.as_uuid())
        .bind(number)
        .execute(&mut *tx)
        .await?;

        // The balance is credited exactly once, on the transition into
        // PROCESSED.
        if status == OrderStatus::Processed && previous != OrderStatus::Processed {
            sqlx::query("UPDATE balances SET balance = balance + $1 WHERE user_id = $2")
                .bind(accrual.amount())
                .bind(user_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn get_order(&self, user_id: UserId, number: &str) -> LoyaltyResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_number, status, accrual, uploaded_at, updated_at
            FROM orders WHERE user_id = $1 AND order_number = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn get_orders(&self, user_id: UserId) -> LoyaltyResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_number, status, accrual, uploaded_at, updated_at
            FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn withdrawal_request(
        &self,
        user_id: UserId,
        order_number: &OrderNumber,
        sum: Points,
    ) -> LoyaltyResult<()> {
        let withdrawal = Withdrawal::pending(user_id, order_number.clone(), sum);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO withdrawals (id, user_id, order_number, sum, status) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(withdrawal.id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(&withdrawal.order_number)
        .bind(sum.amount())
        .bind(WithdrawalStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        // The row lock serializes this debit against concurrent
        // withdrawals and reconciliation credits.
        let current: Decimal =
            sqlx::query_scalar("SELECT balance FROM balances WHERE user_id = $1 FOR UPDATE")
                .bind(user_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        let current =
            Points::new(current).map_err(|err| LoyaltyError::Internal(err.to_string()))?;

        let Some(remaining) = current.checked_sub(sum) else {
            // Dropping the transaction rolls back the pending row.
            return Err(LoyaltyError::InsufficientBalance);
        };

        sqlx::query("UPDATE balances SET balance = $1 WHERE user_id = $2")
            .bind(remaining.amount())
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE withdraw_balances SET sum = sum + $1 WHERE user_id = $2")
            .bind(sum.amount())
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE withdrawals SET status = $1, processed_at = $2 WHERE id = $3")
            .bind(WithdrawalStatus::Success.as_str())
            .bind(Utc::now())
            .bind(withdrawal.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn get_balance(&self, user_id: UserId) -> LoyaltyResult<Balance> {
        let current: Decimal =
            sqlx::query_scalar("SELECT balance FROM balances WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        let withdrawn: Decimal =
            sqlx::query_scalar("SELECT sum FROM withdraw_balances WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(Balance {
            current: Points::new(current).map_err(|err| LoyaltyError::Internal(err.to_string()))?,
            withdrawn: Points::new(withdrawn)
                .map_err(|err| LoyaltyError::Internal(err.to_string()))?,
        })
    }

    async fn get_withdrawals(&self, user_id: UserId) -> LoyaltyResult<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<_, WithdrawalRow>(
            r#"
            SELECT id, user_id, order_number, sum, status, processed_at
            FROM withdrawals WHERE user_id = $1 AND status = $2
            ORDER BY processed_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(WithdrawalStatus::Success.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WithdrawalRow::into_withdrawal).collect()
    }
}

/// PostgreSQL unique-constraint violation (error code 23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    login: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId::from_uuid(self.id),
            login: self.login,
            password_digest: self.password,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    order_number: String,
    status: String,
    accrual: Decimal,
    uploaded_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> LoyaltyResult<Order> {
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            number: OrderNumber::parse(&self.order_number)
                .map_err(|err| LoyaltyError::Internal(err.to_string()))?,
            status: self
                .status
                .parse()
                .map_err(|err: crate::domain::value_object::order_status::ParseOrderStatusError| {
                    LoyaltyError::Internal(err.to_string())
                })?,
            accrual: Points::new(self.accrual)
                .map_err(|err| LoyaltyError::Internal(err.to_string()))?,
            uploaded_at: self.uploaded_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WithdrawalRow {
    id: Uuid,
    user_id: Uuid,
    order_number: String,
    sum: Decimal,
    status: String,
    processed_at: Option<DateTime<Utc>>,
}

impl WithdrawalRow {
    fn into_withdrawal(self) -> LoyaltyResult<Withdrawal> {
        Ok(Withdrawal {
            id: WithdrawalId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            order_number: self.order_number,
            sum: Points::new(self.sum).map_err(|err| LoyaltyError::Internal(err.to_string()))?,
            status: self.status.parse().map_err(
                |err: crate::domain::entity::withdrawal::ParseWithdrawalStatusError| {
                    LoyaltyError::Internal(err.to_string())
                },
            )?,
            processed_at: self.processed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PendingOrderRow {
    order_number: String,
    status: String,
    user_id: Uuid,
}

impl PendingOrderRow {
    fn into_pending(
        self,
    ) -> Result<PendingOrder, crate::domain::value_object::order_status::ParseOrderStatusError>
    {
        Ok(PendingOrder {
            user_id: UserId::from_uuid(self.user_id),
            number: self.order_number,
            status: self.status.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_row_parses_into_domain_types() {
        let row = OrderRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_number: "125".to_string(),
            status: "PROCESSED".to_string(),
            accrual: Decimal::new(4200, 2),
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let order = row.into_order().unwrap();
        assert_eq!(order.status, OrderStatus::Processed);
        assert_eq!(order.accrual.amount(), Decimal::new(4200, 2));
    }

    #[test]
    fn test_order_row_rejects_unknown_status() {
        let row = OrderRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_number: "125".to_string(),
            status: "DONE".to_string(),
            accrual: Decimal::ZERO,
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(row.into_order(), Err(LoyaltyError::Internal(_))));
    }

    #[test]
    fn test_pending_row_conversion() {
        let row = PendingOrderRow {
            order_number: "125".to_string(),
            status: "NEW".to_string(),
            user_id: Uuid::new_v4(),
        };
        let pending = row.into_pending().unwrap();
        assert_eq!(pending.status, OrderStatus::New);
        assert_eq!(pending.number, "125");
    }
}
