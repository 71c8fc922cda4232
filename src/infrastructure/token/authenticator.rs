//! Bearer token issuing and verification

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::generator::{hash_token, TokenGenerator};
use crate::domain::token::is_well_formed;
use crate::domain::{
    Clock, DomainError, IssuedToken, Scope, TokenRepository, User, UserId, UserRepository,
};
use crate::infrastructure::storage::{with_deadline, DEFAULT_STORE_TIMEOUT};

/// Issues, verifies and revokes scoped bearer tokens
///
/// Malformed, unknown, expired and wrong-scope tokens all fail with the
/// same `InvalidCredential`.
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    generator: TokenGenerator,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl TokenAuthenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            tokens,
            generator: TokenGenerator::default(),
            clock,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_generator(mut self, generator: TokenGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Issue a token and persist its digest
    ///
    /// The plaintext in the returned value is the only copy.
    pub async fn issue(
        &self,
        user_id: UserId,
        ttl: chrono::Duration,
        scope: Scope,
    ) -> Result<IssuedToken, DomainError> {
        let token = self.generator.generate(user_id, ttl, scope, self.clock.now())?;

        with_deadline(self.store_timeout, "insert_token", self.tokens.insert(token.record())).await?;

        debug!(user_id = %user_id, scope = %scope, expiry = %token.expiry(), "Issued token");
        Ok(token)
    }

    /// Resolve a presented token to its owner
    pub async fn authenticate(&self, plaintext: &str, scope: Scope) -> Result<User, DomainError> {
        if !is_well_formed(plaintext) {
            return Err(DomainError::InvalidCredential);
        }

        let hash = hash_token(plaintext);
        let now = self.clock.now();

        let user = with_deadline(
            self.store_timeout,
            "get_user_for_token",
            self.users.get_for_token(scope, &hash, now),
        )
        .await?;

        user.ok_or(DomainError::InvalidCredential)
    }

    /// Delete every token of `scope` held by `user_id`
    pub async fn invalidate(&self, user_id: UserId, scope: Scope) -> Result<(), DomainError> {
        with_deadline(
            self.store_timeout,
            "delete_tokens",
            self.tokens.delete_all_for_user(scope, user_id),
        )
        .await?;

        debug!(user_id = %user_id, scope = %scope, "Invalidated tokens");
        Ok(())
    }
}
