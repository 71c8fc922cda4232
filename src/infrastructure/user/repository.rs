//! In-memory user repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    DomainError, NewUser, Scope, TokenHash, User, UserId, UserRepository, Versioned,
};
use crate::infrastructure::storage::InMemoryStore;

/// User table of an [`InMemoryStore`]
///
/// Emails are unique case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    store: InMemoryStore,
}

impl InMemoryUserRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, DomainError> {
        let created_at = self.store.now();
        let mut tables = self.store.write().await;

        if tables.users.values().any(|u| same_email(u.email(), &user.email)) {
            return Err(DomainError::DuplicateEmail);
        }

        let id = tables.allocate_user_id();
        let stored = User::from_parts(
            UserId::new(id),
            created_at,
            user.name,
            user.email,
            user.password_hash,
            false,
            1,
        );
        tables.users.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.store.read().await.users.get(&id.as_i64()).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.store.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| same_email(u.email(), email))
            .cloned())
    }

    async fn get_for_token(
        &self,
        scope: Scope,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DomainError> {
        let tables = self.store.read().await;

        let Some(record) = tables.tokens.get(hash).filter(|t| t.is_live(scope, now)) else {
            return Ok(None);
        };

        Ok(tables.users.get(&record.user_id.as_i64()).cloned())
    }

    async fn update(&self, user: &User, expected: i32) -> Result<Option<i32>, DomainError> {
        let mut tables = self.store.write().await;
        let id = user.id().as_i64();

        if tables
            .users
            .iter()
            .any(|(other, u)| *other != id && same_email(u.email(), user.email()))
        {
            return Err(DomainError::DuplicateEmail);
        }

        let Some(stored) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if stored.version() != expected {
            return Ok(None);
        }

        let new_version = expected + 1;
        let mut updated = user.clone();
        updated.set_version(new_version);
        *stored = updated;

        Ok(Some(new_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Clock, ManualClock, TokenRecord};
    use crate::infrastructure::token::hash_token;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_version() {
        let repo = InMemoryUserRepository::default();
        let a = repo.insert(new_user("a@example.com")).await.unwrap();
        let b = repo.insert(new_user("b@example.com")).await.unwrap();

        assert_eq!(a.id(), UserId::new(1));
        assert_eq!(b.id(), UserId::new(2));
        assert_eq!(a.version(), 1);
        assert!(!a.is_activated());
    }

    #[tokio::test]
    async fn test_duplicate_email_ignores_case() {
        let repo = InMemoryUserRepository::default();
        repo.insert(new_user("alice@example.com")).await.unwrap();

        let result = repo.insert(new_user("ALICE@example.com")).await;
        assert!(matches!(result, Err(DomainError::DuplicateEmail)));
        assert!(repo.get_by_email("Alice@Example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let repo = InMemoryUserRepository::default();
        let mut user = repo.insert(new_user("alice@example.com")).await.unwrap();
        user.activate();

        assert_eq!(repo.update(&user, 1).await.unwrap(), Some(2));
        assert_eq!(repo.update(&user, 1).await.unwrap(), None);

        let stored = repo.get(user.id()).await.unwrap().unwrap();
        assert!(stored.is_activated());
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn test_get_for_token_checks_scope_and_expiry() {
        let clock = ManualClock::default();
        let store = InMemoryStore::new(Arc::new(clock.clone()));
        let repo = InMemoryUserRepository::new(store.clone());
        let user = repo.insert(new_user("alice@example.com")).await.unwrap();

        let hash = hash_token("Y3QMGX3PJ3WLRL2YRTQGQ6KRHU");
        store.write().await.tokens.insert(
            hash,
            TokenRecord {
                hash,
                user_id: user.id(),
                expiry: clock.now() + chrono::Duration::minutes(5),
                scope: Scope::Activation,
            },
        );

        let now = clock.now();
        assert!(repo.get_for_token(Scope::Activation, &hash, now).await.unwrap().is_some());
        assert!(repo.get_for_token(Scope::Authentication, &hash, now).await.unwrap().is_none());

        let later = now + chrono::Duration::minutes(5);
        assert!(repo.get_for_token(Scope::Activation, &hash, later).await.unwrap().is_none());
    }
}
