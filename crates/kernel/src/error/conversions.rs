//! Error conversions - boundary integrations for [`AppError`]
//!
//! The HTTP rendering lives here so that domain crates can convert their
//! errors into [`AppError`] without pulling in axum themselves.

#[cfg(feature = "axum")]
use super::app_error::AppError;

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Error bodies carry exactly one field.
        let body = serde_json::json!({
            "message": self.message(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod tests {
    use crate::error::app_error::AppError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_is_preserved() {
        let response = AppError::conflict("User already exists").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::payment_required("Insufficient balance").into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }
}
