//! Greenlight
//!
//! A JSON API for a movie catalog with:
//! - Per-client token bucket rate limiting
//! - Opaque bearer tokens stored only as SHA-256 digests
//! - Permission checks per route
//! - Optimistic locking on every update

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{Clock, SystemClock};
use infrastructure::storage::StorageFactory;
use tracing::info;

/// Create the application state over the configured storage backend
pub async fn create_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let storage = config.storage_config()?;

    info!(backend = ?storage.storage_type(), "Initializing storage");
    let repos = StorageFactory::create(&storage, clock.clone()).await?;

    Ok(AppState::new(config, repos, clock))
}
