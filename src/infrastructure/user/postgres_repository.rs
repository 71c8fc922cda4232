//! PostgreSQL user repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::{DomainError, NewUser, Scope, TokenHash, User, UserId, UserRepository};
use crate::infrastructure::storage::{is_unique_violation, map_sqlx_error};

const USER_COLUMNS: &str = "users.id, users.created_at, users.name, users.email::text AS email, \
                            users.password_hash, users.activated, users.version";

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, activated)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id, created_at, version
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateEmail
            } else {
                map_sqlx_error("Failed to insert user", e)
            }
        })?;

        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("Failed to read user id", e))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| map_sqlx_error("Failed to read user created_at", e))?;
        let version: i32 = row
            .try_get("version")
            .map_err(|e| map_sqlx_error("Failed to read user version", e))?;

        Ok(User::from_parts(
            UserId::new(id),
            created_at,
            user.name,
            user.email,
            user.password_hash,
            false,
            version,
        ))
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE email = $1::citext", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get user by email", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_for_token(
        &self,
        scope: Scope,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DomainError> {
        let query = format!(
            r#"
            SELECT {}
            FROM users
            INNER JOIN tokens ON users.id = tokens.user_id
            WHERE tokens.hash = $1 AND tokens.scope = $2 AND tokens.expiry > $3
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(hash.as_bytes().as_slice())
            .bind(scope.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get user for token", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn update(&self, user: &User, expected: i32) -> Result<Option<i32>, DomainError> {
        let version: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
            "#,
        )
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.is_activated())
        .bind(user.id().as_i64())
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateEmail
            } else {
                map_sqlx_error("Failed to update user", e)
            }
        })?;

        Ok(version)
    }
}

fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let read = |e| map_sqlx_error("Failed to decode user row", e);

    Ok(User::from_parts(
        UserId::new(row.try_get("id").map_err(read)?),
        row.try_get("created_at").map_err(read)?,
        row.try_get::<String, _>("name").map_err(read)?,
        row.try_get::<String, _>("email").map_err(read)?,
        row.try_get::<String, _>("password_hash").map_err(read)?,
        row.try_get("activated").map_err(read)?,
        row.try_get("version").map_err(read)?,
    ))
}
