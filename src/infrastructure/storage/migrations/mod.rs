//! Embedded schema migrations

use sqlx::postgres::PgPool;
use tracing::info;

use super::postgres::map_sqlx_error;
use crate::domain::DomainError;

/// One schema change with its inverse
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

/// Applies and reverts migrations, tracked in `_migrations`
#[derive(Debug, Clone)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to create migrations table", e))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to check migration status", e))
    }

    /// Apply `migration` unless already recorded
    ///
    /// The schema change and its bookkeeping row commit together.
    pub async fn apply(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin migration", e))?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(&format!("Failed to run migration {}", migration.version), e))?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to record migration", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit migration", e))?;

        info!(version = migration.version, description = migration.description, "Applied migration");
        Ok(true)
    }

    /// Revert `migration` if it is recorded
    pub async fn revert(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if !self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin revert", e))?;

        sqlx::raw_sql(migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(&format!("Failed to revert migration {}", migration.version), e))?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to remove migration record", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit revert", e))?;

        info!(version = migration.version, "Reverted migration");
        Ok(true)
    }

    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get migration version", e))
    }
}

pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create movies table",
            up: r#"
                CREATE TABLE IF NOT EXISTS movies (
                    id BIGSERIAL PRIMARY KEY,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    title TEXT NOT NULL,
                    year INTEGER NOT NULL,
                    runtime INTEGER NOT NULL,
                    genres TEXT[] NOT NULL,
                    version INTEGER NOT NULL DEFAULT 1
                );
            "#,
            down: "DROP TABLE IF EXISTS movies;",
        },
        Migration {
            version: 2,
            description: "Add movies check constraints",
            up: r#"
                ALTER TABLE movies ADD CONSTRAINT movies_runtime_check CHECK (runtime >= 0);
                ALTER TABLE movies ADD CONSTRAINT movies_year_check
                    CHECK (year BETWEEN 1888 AND date_part('year', now()));
                ALTER TABLE movies ADD CONSTRAINT genres_length_check
                    CHECK (array_length(genres, 1) BETWEEN 1 AND 5);
            "#,
            down: r#"
                ALTER TABLE movies DROP CONSTRAINT IF EXISTS movies_runtime_check;
                ALTER TABLE movies DROP CONSTRAINT IF EXISTS movies_year_check;
                ALTER TABLE movies DROP CONSTRAINT IF EXISTS genres_length_check;
            "#,
        },
        Migration {
            version: 3,
            description: "Add movies full-text and genre indexes",
            up: r#"
                CREATE INDEX IF NOT EXISTS movies_title_idx
                    ON movies USING GIN (to_tsvector('simple', title));
                CREATE INDEX IF NOT EXISTS movies_genres_idx ON movies USING GIN (genres);
            "#,
            down: r#"
                DROP INDEX IF EXISTS movies_title_idx;
                DROP INDEX IF EXISTS movies_genres_idx;
            "#,
        },
        Migration {
            version: 4,
            description: "Create users table",
            up: r#"
                CREATE EXTENSION IF NOT EXISTS citext;
                CREATE TABLE IF NOT EXISTS users (
                    id BIGSERIAL PRIMARY KEY,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    name TEXT NOT NULL,
                    email CITEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    activated BOOLEAN NOT NULL,
                    version INTEGER NOT NULL DEFAULT 1
                );
            "#,
            down: "DROP TABLE IF EXISTS users;",
        },
        Migration {
            version: 5,
            description: "Create tokens table",
            up: r#"
                CREATE TABLE IF NOT EXISTS tokens (
                    hash BYTEA PRIMARY KEY,
                    user_id BIGINT NOT NULL REFERENCES users ON DELETE CASCADE,
                    expiry TIMESTAMPTZ NOT NULL,
                    scope TEXT NOT NULL
                );
            "#,
            down: "DROP TABLE IF EXISTS tokens;",
        },
        Migration {
            version: 6,
            description: "Create permissions tables",
            up: r#"
                CREATE TABLE IF NOT EXISTS permissions (
                    id BIGSERIAL PRIMARY KEY,
                    code TEXT NOT NULL UNIQUE
                );
                CREATE TABLE IF NOT EXISTS users_permissions (
                    user_id BIGINT NOT NULL REFERENCES users ON DELETE CASCADE,
                    permission_id BIGINT NOT NULL REFERENCES permissions ON DELETE CASCADE,
                    PRIMARY KEY (user_id, permission_id)
                );
                INSERT INTO permissions (code) VALUES ('movies:read'), ('movies:write')
                    ON CONFLICT (code) DO NOTHING;
            "#,
            down: r#"
                DROP TABLE IF EXISTS users_permissions;
                DROP TABLE IF EXISTS permissions;
            "#,
        },
    ]
}

/// Apply every pending migration in version order
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in schema_migrations() {
        if migrator.apply(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}
