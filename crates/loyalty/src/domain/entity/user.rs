//! User Entity

use chrono::{DateTime, Utc};

use crate::domain::value_object::user_id::UserId;

/// Registered user
///
/// Created on registration, never mutated, never deleted. The password
/// digest is the unsalted SHA-256 the storage contract expects.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Globally unique login
    pub login: String,
    /// lowercase-hex SHA-256 of the password
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh identifier.
    pub fn new(login: impl Into<String>, password_digest: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            login: login.into(),
            password_digest: password_digest.into(),
            created_at: Utc::now(),
        }
    }
}
