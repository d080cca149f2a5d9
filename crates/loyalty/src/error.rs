//! Loyalty Error Types
//!
//! This module provides the domain error variants that integrate with the
//! unified `kernel::error::AppError` system. Handlers return these directly;
//! the mapping to HTTP happens exactly once, here.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::order_number::OrderNumberError;

/// Loyalty-specific result type alias
pub type LoyaltyResult<T> = Result<T, LoyaltyError>;

/// Loyalty-specific error variants
#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// Order number contains something other than decimal digits
    #[error("Invalid order number")]
    OrderNumberNotNumeric,

    /// Order number fails the Luhn checksum
    #[error("Invalid order number")]
    OrderNumberChecksum,

    /// Missing, malformed or expired bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Login/password pair matches no user
    #[error("Invalid login or password")]
    InvalidCredentials,

    /// Registration collision on login
    #[error("User already exists")]
    DuplicateLogin,

    /// Unique violation on the order number; the upload flow resolves
    /// this into either "already yours" or [`LoyaltyError::OrderOwnedByAnother`]
    #[error("Order already uploaded")]
    DuplicateOrder,

    /// Order number belongs to a different user
    #[error("Order number is already uploaded by another user")]
    OrderOwnedByAnother,

    /// Withdrawal exceeds the current balance
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Withdrawal sum is zero or negative
    #[error("Withdrawal sum must be positive")]
    NonPositiveWithdrawal,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoyaltyError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoyaltyError::OrderNumberNotNumeric => ErrorKind::BadRequest,
            LoyaltyError::OrderNumberChecksum | LoyaltyError::NonPositiveWithdrawal => {
                ErrorKind::UnprocessableEntity
            }
            LoyaltyError::Unauthorized | LoyaltyError::InvalidCredentials => ErrorKind::Unauthorized,
            LoyaltyError::DuplicateLogin
            | LoyaltyError::DuplicateOrder
            | LoyaltyError::OrderOwnedByAnother => ErrorKind::Conflict,
            LoyaltyError::InsufficientBalance => ErrorKind::PaymentRequired,
            LoyaltyError::Database(_) | LoyaltyError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures are masked; response bodies never carry raw
    /// backend text.
    pub fn to_app_error(&self) -> AppError {
        let kind = self.kind();
        if kind.is_server_error() {
            AppError::new(kind, "Internal server error")
        } else {
            AppError::new(kind, self.to_string())
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            LoyaltyError::Database(e) => {
                tracing::error!(error = %e, "Ledger database error");
            }
            LoyaltyError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal error");
            }
            LoyaltyError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<OrderNumberError> for LoyaltyError {
    fn from(err: OrderNumberError) -> Self {
        match err {
            OrderNumberError::NotNumeric => LoyaltyError::OrderNumberNotNumeric,
            OrderNumberError::Checksum => LoyaltyError::OrderNumberChecksum,
        }
    }
}

impl From<platform::token::TokenError> for LoyaltyError {
    fn from(err: platform::token::TokenError) -> Self {
        match err {
            platform::token::TokenError::Invalid => LoyaltyError::Unauthorized,
            platform::token::TokenError::Signing(e) => LoyaltyError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(LoyaltyError::OrderNumberNotNumeric.kind().status_code(), 400);
        assert_eq!(LoyaltyError::Unauthorized.kind().status_code(), 401);
        assert_eq!(LoyaltyError::InvalidCredentials.kind().status_code(), 401);
        assert_eq!(LoyaltyError::InsufficientBalance.kind().status_code(), 402);
        assert_eq!(LoyaltyError::DuplicateLogin.kind().status_code(), 409);
        assert_eq!(LoyaltyError::OrderOwnedByAnother.kind().status_code(), 409);
        assert_eq!(LoyaltyError::OrderNumberChecksum.kind().status_code(), 422);
        assert_eq!(LoyaltyError::Internal("boom".into()).kind().status_code(), 500);
    }

    #[test]
    fn test_server_errors_are_masked() {
        let err = LoyaltyError::Internal("connection reset by peer".into());
        assert_eq!(err.to_app_error().message(), "Internal server error");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = LoyaltyError::DuplicateLogin;
        assert_eq!(err.to_app_error().message(), "User already exists");
    }

    #[test]
    fn test_order_number_error_conversion() {
        let err: LoyaltyError = OrderNumberError::NotNumeric.into();
        assert!(matches!(err, LoyaltyError::OrderNumberNotNumeric));

        let err: LoyaltyError = OrderNumberError::Checksum.into();
        assert!(matches!(err, LoyaltyError::OrderNumberChecksum));
    }
}
