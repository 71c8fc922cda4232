//! Token repository trait

use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::{Scope, TokenRecord};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Storage for token digests
///
/// Lookup by digest lives on [`crate::domain::user::UserRepository::get_for_token`]
/// so the owner is resolved in the same store call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync + Debug {
    async fn insert(&self, record: &TokenRecord) -> Result<(), DomainError>;

    /// Delete every token of `scope` owned by `user_id`
    async fn delete_all_for_user(&self, scope: Scope, user_id: UserId) -> Result<(), DomainError>;
}
