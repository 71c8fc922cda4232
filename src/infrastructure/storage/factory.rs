//! Runtime selection of the storage backend

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use super::in_memory::InMemoryStore;
use super::migrations::run_migrations;
use super::postgres::{connect, PostgresConfig};
use crate::domain::{
    Clock, DomainError, MovieRepository, PermissionRepository, TokenRepository, UserRepository,
};
use crate::infrastructure::movie::{InMemoryMovieRepository, PostgresMovieRepository};
use crate::infrastructure::permission::{InMemoryPermissionRepository, PostgresPermissionRepository};
use crate::infrastructure::token::{InMemoryTokenRepository, PostgresTokenRepository};
use crate::infrastructure::user::{InMemoryUserRepository, PostgresUserRepository};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// One repository per entity, all backed by the same store
#[derive(Debug, Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub movies: Arc<dyn MovieRepository>,
}

impl Repositories {
    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            tokens: Arc::new(InMemoryTokenRepository::new(store.clone())),
            permissions: Arc::new(InMemoryPermissionRepository::new(store.clone())),
            movies: Arc::new(InMemoryMovieRepository::new(store)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            tokens: Arc::new(PostgresTokenRepository::new(pool.clone())),
            permissions: Arc::new(PostgresPermissionRepository::new(pool.clone())),
            movies: Arc::new(PostgresMovieRepository::new(pool)),
        }
    }
}

/// Factory for creating the repository set
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Build repositories for `config`
    ///
    /// The postgres backend connects and applies pending migrations first.
    pub async fn create(
        config: &StorageConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Repositories, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory storage");
                Ok(Repositories::in_memory(InMemoryStore::new(clock)))
            }
            StorageConfig::Postgres(pg) => {
                let pool = connect(pg).await?;
                let applied = run_migrations(&pool).await?;
                info!(applied, "Using PostgreSQL storage");
                Ok(Repositories::postgres(pool))
            }
        }
    }
}
