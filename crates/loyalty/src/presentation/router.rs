//! Loyalty Router

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use platform::token::TokenCodec;

use crate::infra::accrual::AccrualClient;
use crate::infra::postgres::PgLedgerRepository;
use crate::presentation::handlers::{self, LoyaltyAppState};
use crate::presentation::middleware::require_bearer_auth;

/// Create the loyalty router with the PostgreSQL ledger
///
/// `register` and `login` are the only public routes; everything else goes
/// through the bearer-auth middleware.
pub fn loyalty_router(
    repo: PgLedgerRepository,
    accrual: AccrualClient,
    tokens: Arc<TokenCodec>,
) -> Router {
    let state = LoyaltyAppState {
        repo: Arc::new(repo),
        accrual: Arc::new(accrual),
        tokens: tokens.clone(),
    };

    let protected = Router::new()
        .route(
            "/orders",
            post(handlers::upload_order::<PgLedgerRepository>)
                .get(handlers::list_orders::<PgLedgerRepository>),
        )
        .route("/balance", get(handlers::balance::<PgLedgerRepository>))
        .route(
            "/balance/withdraw",
            post(handlers::withdraw::<PgLedgerRepository>),
        )
        .route(
            "/withdrawals",
            get(handlers::list_withdrawals::<PgLedgerRepository>),
        )
        .route_layer(from_fn_with_state(tokens, require_bearer_auth));

    Router::new()
        .route("/register", post(handlers::register::<PgLedgerRepository>))
        .route("/login", post(handlers::login::<PgLedgerRepository>))
        .merge(protected)
        .with_state(state)
}
