//! Storage infrastructure - backends, deadlines and migrations

mod deadline;
mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use deadline::{with_deadline, DEFAULT_STORE_TIMEOUT};
pub use factory::{Repositories, StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStore;
pub use migrations::{run_migrations, Migration, PostgresMigrator};
pub use postgres::{connect, is_unique_violation, map_sqlx_error, PostgresConfig};
