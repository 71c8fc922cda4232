//! Migrate command - manages the PostgreSQL schema

use clap::{Args, Subcommand};
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::migrations::schema_migrations;
use crate::infrastructure::storage::{connect, PostgresMigrator, StorageConfig};

#[derive(Debug, Clone, Args)]
pub struct MigrateArgs {
    /// PostgreSQL DSN; defaults to storage.dsn
    #[arg(long = "db-dsn")]
    pub db_dsn: Option<String>,

    #[command(subcommand)]
    pub action: Option<MigrateAction>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum MigrateAction {
    /// Apply every pending migration (default)
    Up,

    /// Revert the most recent migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },

    /// Print the current schema version
    Status,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(dsn) = &args.db_dsn {
        config.storage.backend = "postgres".to_string();
        config.storage.dsn = Some(dsn.clone());
    }

    init_logging(&config.logging);

    let StorageConfig::Postgres(pg) = config.storage_config()? else {
        anyhow::bail!("migrations require the postgres storage backend");
    };

    let pool = connect(&pg).await?;
    let migrator = PostgresMigrator::new(pool);

    match args.action.unwrap_or(MigrateAction::Up) {
        MigrateAction::Up => {
            let mut applied = 0;
            for migration in schema_migrations() {
                if migrator.apply(&migration).await? {
                    applied += 1;
                }
            }
            info!(applied, "Migrations applied");
        }
        MigrateAction::Down { steps } => {
            let mut reverted = 0;
            for migration in schema_migrations().iter().rev() {
                if reverted == steps {
                    break;
                }
                if migrator.revert(migration).await? {
                    reverted += 1;
                }
            }
            info!(reverted, "Migrations reverted");
        }
        MigrateAction::Status => {
            let version = migrator.current_version().await?;
            info!(version = ?version, "Current schema version");
        }
    }

    Ok(())
}
