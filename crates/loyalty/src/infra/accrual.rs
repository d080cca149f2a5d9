//! Accrual Provider Client
//!
//! One HTTP call per invocation; retry policy belongs to the caller
//! (the reconciliation pool).

use reqwest::StatusCode;
use reqwest::header;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::value_object::order_status::OrderStatus;
use crate::domain::value_object::points::{Points, PointsError};

/// Accrual client errors
///
/// Everything here is transient from the pipeline's point of view: the
/// scanner will re-emit the order on its next tick.
#[derive(Debug, Error)]
pub enum AccrualError {
    /// Transport failure or malformed body
    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any status outside 200/204/429
    #[error("Provider returned unexpected status {0}")]
    UnexpectedStatus(u16),

    /// 429 without a usable Retry-After header
    #[error("Provider sent a malformed Retry-After header")]
    BadRetryAfter,
}

/// Order state as reported by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderOrder {
    #[serde(rename = "order")]
    pub number: String,
    pub status: ProviderStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub accrual: Option<Decimal>,
}

impl ProviderOrder {
    /// Local status this provider state maps to.
    pub fn order_status(&self) -> OrderStatus {
        self.status.into_order_status()
    }

    /// Awarded points, zero when the provider sent none.
    pub fn accrual_points(&self) -> Result<Points, PointsError> {
        Points::new(self.accrual.unwrap_or_default())
    }
}

/// Provider-side status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl ProviderStatus {
    /// `REGISTERED` means the provider knows the order but has not judged
    /// it yet, which is our `NEW`.
    pub fn into_order_status(self) -> OrderStatus {
        match self {
            ProviderStatus::Registered => OrderStatus::New,
            ProviderStatus::Processing => OrderStatus::Processing,
            ProviderStatus::Invalid => OrderStatus::Invalid,
            ProviderStatus::Processed => OrderStatus::Processed,
        }
    }
}

/// Reply of one provider call
#[derive(Debug)]
pub enum AccrualReply {
    /// 200 with an order record
    Found(ProviderOrder),
    /// 204: the provider has no record of this order yet
    NoContent,
    /// 429 with the announced cool-down in seconds
    RateLimited(u64),
}

/// Stateless client for the accrual provider
#[derive(Clone)]
pub struct AccrualClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccrualClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET {base}/api/orders/{number}`, decoded into an [`AccrualReply`].
    pub async fn order_status(&self, number: &str) -> Result<AccrualReply, AccrualError> {
        let url = format!("{}/api/orders/{}", self.base_url, number);
        let response = self.http.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(AccrualReply::Found(response.json().await?)),
            StatusCode::NO_CONTENT => Ok(AccrualReply::NoContent),
            StatusCode::TOO_MANY_REQUESTS => {
                let secs = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(parse_retry_after)
                    .ok_or(AccrualError::BadRetryAfter)?;
                Ok(AccrualReply::RateLimited(secs))
            }
            other => Err(AccrualError::UnexpectedStatus(other.as_u16())),
        }
    }
}

/// Seconds variant of Retry-After; HTTP-date values are not expected from
/// the provider and count as malformed.
fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_order_deserializes() {
        let order: ProviderOrder =
            serde_json::from_str(r#"{"order":"125","status":"PROCESSED","accrual":42.0}"#)
                .unwrap();
        assert_eq!(order.number, "125");
        assert_eq!(order.order_status(), OrderStatus::Processed);
        assert_eq!(
            order.accrual_points().unwrap().amount(),
            Decimal::new(4200, 2)
        );
    }

    #[test]
    fn test_missing_accrual_is_zero() {
        let order: ProviderOrder =
            serde_json::from_str(r#"{"order":"125","status":"REGISTERED"}"#).unwrap();
        assert!(order.accrual_points().unwrap().is_zero());
    }

    #[test]
    fn test_registered_maps_to_new() {
        assert_eq!(
            ProviderStatus::Registered.into_order_status(),
            OrderStatus::New
        );
        assert_eq!(
            ProviderStatus::Processed.into_order_status(),
            OrderStatus::Processed
        );
    }

    #[test]
    fn test_unknown_provider_status_is_an_error() {
        let result: Result<ProviderOrder, _> =
            serde_json::from_str(r#"{"order":"125","status":"UNKNOWN"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("3"), Some(3));
        assert_eq!(parse_retry_after(" 60 "), Some(60));
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = AccrualClient::new("http://localhost:8081/");
        assert_eq!(client.base_url, "http://localhost:8081");
    }
}
