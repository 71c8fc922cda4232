//! In-memory permission repository

use async_trait::async_trait;

use crate::domain::permission::{MOVIES_READ, MOVIES_WRITE};
use crate::domain::{DomainError, PermissionRepository, Permissions, UserId};
use crate::infrastructure::storage::InMemoryStore;

/// Codes that exist in the permissions table
const KNOWN_CODES: &[&str] = &[MOVIES_READ, MOVIES_WRITE];

#[derive(Debug, Clone, Default)]
pub struct InMemoryPermissionRepository {
    store: InMemoryStore,
}

impl InMemoryPermissionRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn get_all_for_user(&self, user_id: UserId) -> Result<Permissions, DomainError> {
        let tables = self.store.read().await;
        Ok(tables
            .permissions
            .get(&user_id.as_i64())
            .cloned()
            .unwrap_or_default())
    }

    async fn add_for_user(&self, user_id: UserId, codes: Vec<String>) -> Result<(), DomainError> {
        let mut tables = self.store.write().await;

        if !tables.users.contains_key(&user_id.as_i64()) {
            return Err(DomainError::invariant(format!("user {} does not exist", user_id)));
        }

        let granted = tables.permissions.entry(user_id.as_i64()).or_default();
        for code in codes {
            if KNOWN_CODES.contains(&code.as_str()) {
                granted.insert(code);
            }
        }

        Ok(())
    }
}
