//! PostgreSQL token repository

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{DomainError, Scope, TokenRecord, TokenRepository, UserId};
use crate::infrastructure::storage::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn insert(&self, record: &TokenRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.hash.as_bytes().as_slice())
        .bind(record.user_id.as_i64())
        .bind(record.expiry)
        .bind(record.scope.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert token", e))?;

        Ok(())
    }

    async fn delete_all_for_user(&self, scope: Scope, user_id: UserId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
            .bind(scope.as_str())
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete tokens", e))?;

        Ok(())
    }
}
