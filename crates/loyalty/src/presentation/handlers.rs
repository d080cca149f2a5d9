//! HTTP Handlers
//!
//! Thin adapters: decode the request, run the use case, translate the
//! outcome. Error-to-status mapping lives in `LoyaltyError`.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use platform::token::TokenCodec;

use crate::application::{
    LoginInput, LoginUseCase, RegisterInput, RegisterUseCase, StatementsUseCase,
    UploadOrderUseCase, UploadOutcome, WithdrawInput, WithdrawUseCase,
};
use crate::domain::repository::LedgerRepository;
use crate::error::LoyaltyResult;
use crate::infra::accrual::AccrualClient;
use crate::presentation::dto::{
    BalanceResponse, CredentialsRequest, OrderResponse, WithdrawRequest, WithdrawalResponse,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for the loyalty handlers
#[derive(Clone)]
pub struct LoyaltyAppState<R>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub accrual: Arc<AccrualClient>,
    pub tokens: Arc<TokenCodec>,
}

// ============================================================================
// Register / Login
// ============================================================================

/// POST /api/user/register
pub async fn register<R>(
    State(state): State<LoyaltyAppState<R>>,
    Json(req): Json<CredentialsRequest>,
) -> LoyaltyResult<impl IntoResponse>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.tokens.clone());

    let output = use_case
        .execute(RegisterInput {
            login: req.login,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::OK,
        [(header::AUTHORIZATION, format!("Bearer {}", output.token))],
    ))
}

/// POST /api/user/login
pub async fn login<R>(
    State(state): State<LoyaltyAppState<R>>,
    Json(req): Json<CredentialsRequest>,
) -> LoyaltyResult<impl IntoResponse>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.tokens.clone());

    let output = use_case
        .execute(LoginInput {
            login: req.login,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::OK,
        [(header::AUTHORIZATION, format!("Bearer {}", output.token))],
    ))
}

// ============================================================================
// Orders
// ============================================================================

/// POST /api/user/orders (text/plain order number)
pub async fn upload_order<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    body: String,
) -> LoyaltyResult<StatusCode>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = UploadOrderUseCase::new(state.repo.clone(), state.accrual.clone());

    match use_case.execute(user_id, body.trim()).await? {
        UploadOutcome::Accepted => Ok(StatusCode::ACCEPTED),
        UploadOutcome::AlreadyUploaded => Ok(StatusCode::OK),
    }
}

/// GET /api/user/orders
pub async fn list_orders<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> LoyaltyResult<Response>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = StatementsUseCase::new(state.repo.clone());

    let orders = use_case.orders(user_id).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(Json(body).into_response())
}

// ============================================================================
// Balance / Withdrawals
// ============================================================================

/// GET /api/user/balance
pub async fn balance<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> LoyaltyResult<Json<BalanceResponse>>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = StatementsUseCase::new(state.repo.clone());

    let balance = use_case.balance(user_id).await?;
    Ok(Json(BalanceResponse::from(balance)))
}

/// POST /api/user/balance/withdraw
pub async fn withdraw<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<WithdrawRequest>,
) -> LoyaltyResult<StatusCode>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = WithdrawUseCase::new(state.repo.clone());

    use_case
        .execute(
            user_id,
            WithdrawInput {
                order: req.order,
                sum: req.sum,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}

/// GET /api/user/withdrawals
pub async fn list_withdrawals<R>(
    State(state): State<LoyaltyAppState<R>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> LoyaltyResult<Response>
where
    R: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = StatementsUseCase::new(state.repo.clone());

    let withdrawals = use_case.withdrawals(user_id).await?;
    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body: Vec<WithdrawalResponse> = withdrawals
        .into_iter()
        .map(WithdrawalResponse::from)
        .collect();
    Ok(Json(body).into_response())
}
