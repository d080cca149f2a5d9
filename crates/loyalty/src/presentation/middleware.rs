//! Auth Middleware
//!
//! Verifies the bearer token on every protected route and attaches the
//! typed identity to the request scope; handlers never look at headers.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::token::TokenCodec;

use crate::domain::value_object::user_id::UserId;
use crate::error::LoyaltyError;

/// Verified identity of the current request
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// Middleware that requires a valid bearer token
pub async fn require_bearer_auth(
    State(tokens): State<Arc<TokenCodec>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(token) = bearer_token(req.headers()) else {
        return Err(LoyaltyError::Unauthorized.into_response());
    };

    let user_id = match tokens.verify(token) {
        Ok(id) => UserId::from_uuid(id),
        Err(_) => return Err(LoyaltyError::Unauthorized.into_response()),
    };

    req.extensions_mut().insert(CurrentUser(user_id));

    Ok(next.run(req).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme comparison is case-insensitive per RFC 9110.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_well_formed_bearer() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers_with("bearer token")), Some("token"));
        assert_eq!(bearer_token(&headers_with("BEARER token")), Some("token"));
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
    }
}
