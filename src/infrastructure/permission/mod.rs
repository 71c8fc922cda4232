//! Permission infrastructure module

mod gate;
mod postgres_repository;
mod repository;

pub use gate::PermissionGate;
pub use postgres_repository::PostgresPermissionRepository;
pub use repository::InMemoryPermissionRepository;
