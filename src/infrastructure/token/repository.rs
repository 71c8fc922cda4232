//! In-memory token repository

use async_trait::async_trait;

use crate::domain::{DomainError, Scope, TokenRecord, TokenRepository, UserId};
use crate::infrastructure::storage::InMemoryStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenRepository {
    store: InMemoryStore,
}

impl InMemoryTokenRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, record: &TokenRecord) -> Result<(), DomainError> {
        let mut tables = self.store.write().await;

        if !tables.users.contains_key(&record.user_id.as_i64()) {
            return Err(DomainError::invariant(format!(
                "token owner {} does not exist",
                record.user_id
            )));
        }

        tables.tokens.insert(record.hash, record.clone());
        Ok(())
    }

    async fn delete_all_for_user(&self, scope: Scope, user_id: UserId) -> Result<(), DomainError> {
        let mut tables = self.store.write().await;
        tables
            .tokens
            .retain(|_, t| !(t.scope == scope && t.user_id == user_id));
        Ok(())
    }
}
