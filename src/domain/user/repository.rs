//! User repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::{NewUser, User, UserId};
use crate::domain::concurrency::ConditionalUpdate;
use crate::domain::token::{Scope, TokenHash};
use crate::domain::DomainError;

/// Repository trait for user storage
///
/// Updates go through [`ConditionalUpdate`] so every write is version-checked.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Insert a new user with version 1
    ///
    /// Fails with `DuplicateEmail` when the address is taken.
    async fn insert(&self, user: NewUser) -> Result<User, DomainError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Resolve the owner of a token
    ///
    /// Only rows whose hash and scope match and whose expiry is after `now`
    /// qualify. Anything else is `None`.
    async fn get_for_token(
        &self,
        scope: Scope,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DomainError>;

    /// Write `user` if the stored version still equals `expected`
    ///
    /// Returns the new version, or `None` when no row matched.
    async fn update(&self, user: &User, expected: i32) -> Result<Option<i32>, DomainError>;
}

#[async_trait]
impl<R: UserRepository + ?Sized> ConditionalUpdate<User> for R {
    async fn update_if_version(&self, user: &User, expected: i32) -> Result<Option<i32>, DomainError> {
        self.update(user, expected).await
    }
}
