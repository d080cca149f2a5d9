//! Bearer Tokens
//!
//! Compact HS256-signed JWTs carrying the user identity. Claims are
//! `{sub, iat, exp}` with a 10-minute lifetime; verification checks the
//! signature, the expiry (zero leeway) and that `sub` parses as a UUID.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token lifetime from `iat`.
pub const TOKEN_TTL_SECS: i64 = 10 * 60;

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, expiry or subject check failed
    #[error("Invalid token")]
    Invalid,

    /// Token could not be signed
    #[error("Token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Mints and verifies bearer tokens with a process-wide shared secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    /// Mint a token for the given user id.
    pub fn mint(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Verify a token and return the user id it carries.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn test_mint_verify_roundtrip() {
        let codec = TokenCodec::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = codec.mint(user_id).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_token_has_three_parts() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.mint(Uuid::new_v4()).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 2 * TOKEN_TTL_SECS,
            exp: now - TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.mint(Uuid::new_v4()).unwrap();

        // Flip one character of the signature.
        let mut tampered: Vec<char> = token.chars().collect();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();

        assert!(matches!(codec.verify(&tampered), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let other = TokenCodec::new(b"other-secret");
        let token = codec.mint(Uuid::new_v4()).unwrap();

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::Invalid)));
    }
}
