//! Loyalty-Points Accrual Gateway
//!
//! Multi-tenant loyalty service: authenticated users upload purchase-order
//! numbers, a background pipeline reconciles them against the external
//! accrual provider, and the ledger tracks balances and withdrawals without
//! ever losing or double-counting points.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::config::ReconcileConfig;
pub use application::reconcile::Reconciler;
pub use infra::accrual::AccrualClient;
pub use infra::postgres::PgLedgerRepository;
pub use presentation::router::loyalty_router;
