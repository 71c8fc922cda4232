//! Authorization gate
//!
//! Checks run in a fixed order: authenticated, then activated, then holding
//! a permission code. Each stage implies the ones before it.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::{DomainError, Identity, PermissionRepository, User};
use crate::infrastructure::storage::{with_deadline, DEFAULT_STORE_TIMEOUT};

#[derive(Debug, Clone)]
pub struct PermissionGate {
    permissions: Arc<dyn PermissionRepository>,
    store_timeout: Duration,
}

impl PermissionGate {
    pub fn new(permissions: Arc<dyn PermissionRepository>) -> Self {
        Self {
            permissions,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn require_authenticated<'a>(&self, identity: &'a Identity) -> Result<&'a User, DomainError> {
        identity.user().ok_or(DomainError::AuthenticationRequired)
    }

    pub fn require_activated<'a>(&self, identity: &'a Identity) -> Result<&'a User, DomainError> {
        let user = self.require_authenticated(identity)?;

        if !user.is_activated() {
            return Err(DomainError::InactiveAccount);
        }

        Ok(user)
    }

    /// Permissions are read from the store on every call
    pub async fn require_permission<'a>(
        &self,
        identity: &'a Identity,
        code: &str,
    ) -> Result<&'a User, DomainError> {
        let user = self.require_activated(identity)?;

        let permissions = with_deadline(
            self.store_timeout,
            "get_permissions",
            self.permissions.get_all_for_user(user.id()),
        )
        .await?;

        if !permissions.includes(code) {
            debug!(user_id = %user.id(), code, "Permission denied");
            return Err(DomainError::PermissionDenied);
        }

        Ok(user)
    }
}
