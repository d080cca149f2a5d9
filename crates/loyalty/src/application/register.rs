//! Register Use Case
//!
//! Creates a new user account and signs them in right away.

use std::sync::Arc;

use platform::password;
use platform::token::TokenCodec;

use crate::domain::repository::LedgerRepository;
use crate::error::LoyaltyResult;

/// Register input
pub struct RegisterInput {
    pub login: String,
    pub password: String,
}

/// Register output
pub struct RegisterOutput {
    /// Bearer token for the fresh account
    pub token: String,
}

/// Register use case
pub struct RegisterUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenCodec>,
}

impl<R> RegisterUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, input: RegisterInput) -> LoyaltyResult<RegisterOutput> {
        let digest = password::digest(&input.password);
        let user = self.repo.add_user(&input.login, &digest).await?;

        let token = self.tokens.mint(user.id.into_uuid())?;

        tracing::info!(user_id = %user.id, login = %user.login, "User registered");

        Ok(RegisterOutput { token })
    }
}
