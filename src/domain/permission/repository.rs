use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::Permissions;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Storage for user permission grants
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync + Debug {
    async fn get_all_for_user(&self, user_id: UserId) -> Result<Permissions, DomainError>;

    /// Grant `codes` to `user_id`; unknown codes are ignored
    async fn add_for_user(&self, user_id: UserId, codes: Vec<String>) -> Result<(), DomainError>;
}
