//! PostgreSQL permission repository

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{DomainError, PermissionRepository, Permissions, UserId};
use crate::infrastructure::storage::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn get_all_for_user(&self, user_id: UserId) -> Result<Permissions, DomainError> {
        let codes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT permissions.code
            FROM permissions
            INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
            WHERE users_permissions.user_id = $1
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to get permissions", e))?;

        Ok(codes.into_iter().collect())
    }

    async fn add_for_user(&self, user_id: UserId, codes: Vec<String>) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users_permissions
            SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.as_i64())
        .bind(&codes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to add permissions", e))?;

        Ok(())
    }
}
