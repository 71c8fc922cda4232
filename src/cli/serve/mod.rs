//! Serve command - runs the HTTP API

use std::net::SocketAddr;

use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::rate_limit::spawn_sweeper;

/// Flags that override the loaded configuration
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// API server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Environment (development|staging|production)
    #[arg(long)]
    pub env: Option<String>,

    /// PostgreSQL DSN; selects the postgres backend
    #[arg(long = "db-dsn")]
    pub db_dsn: Option<String>,

    /// Rate limiter maximum requests per second
    #[arg(long = "limiter-rps")]
    pub limiter_rps: Option<f64>,

    /// Rate limiter maximum burst
    #[arg(long = "limiter-burst")]
    pub limiter_burst: Option<u32>,

    /// Enable rate limiter
    #[arg(long = "limiter-enabled")]
    pub limiter_enabled: Option<bool>,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(env) = &self.env {
            config.server.env = env.clone();
        }
        if let Some(dsn) = &self.db_dsn {
            config.storage.backend = "postgres".to_string();
            config.storage.dsn = Some(dsn.clone());
        }
        if let Some(rps) = self.limiter_rps {
            config.limiter.rps = rps;
        }
        if let Some(burst) = self.limiter_burst {
            config.limiter.burst = burst;
        }
        if let Some(enabled) = self.limiter_enabled {
            config.limiter.enabled = enabled;
        }
    }
}

/// Run the API server until Ctrl+C or SIGTERM
///
/// In-flight requests drain first, then the limiter sweep is stopped and
/// pending background tasks are awaited.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    args.apply(&mut config);
    config.validate()?;

    init_logging(&config.logging);

    let addr = build_socket_addr(&config)?;
    let state = crate::create_app_state(config).await?;
    let sweeper = spawn_sweeper(state.rate_limiter.clone());
    let background = state.background.clone();

    let app = create_router(state);

    info!(%addr, "Starting server");
    let listener = TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.stop().await;
    info!("Waiting for background tasks");
    background.wait().await;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}
