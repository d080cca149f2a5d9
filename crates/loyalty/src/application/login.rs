//! Login Use Case

use std::sync::Arc;

use platform::password;
use platform::token::TokenCodec;

use crate::domain::repository::LedgerRepository;
use crate::error::{LoyaltyError, LoyaltyResult};

/// Login input
pub struct LoginInput {
    pub login: String,
    pub password: String,
}

/// Login output
pub struct LoginOutput {
    pub token: String,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenCodec>,
}

impl<R> LoginUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, input: LoginInput) -> LoyaltyResult<LoginOutput> {
        let digest = password::digest(&input.password);

        let user = self
            .repo
            .get_user(&input.login, &digest)
            .await?
            .ok_or(LoyaltyError::InvalidCredentials)?;

        let token = self.tokens.mint(user.id.into_uuid())?;

        tracing::debug!(user_id = %user.id, "User authenticated");

        Ok(LoginOutput { token })
    }
}
