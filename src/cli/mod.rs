//! Command line interface
//!
//! - `serve`: run the HTTP API (default)
//! - `migrate`: apply or revert the PostgreSQL schema

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Greenlight - movie catalog JSON API
#[derive(Parser)]
#[command(name = "greenlight")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(serve::ServeArgs),

    /// Manage the PostgreSQL schema
    Migrate(migrate::MigrateArgs),
}
