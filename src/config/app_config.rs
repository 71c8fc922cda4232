use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::rate_limit::RateLimitConfig;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};
use crate::infrastructure::user::TokenTtls;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub limiter: LimiterConfig,
    pub storage: StorageSettings,
    pub tokens: TokensConfig,
    pub cors: CorsConfig,
    pub mailer: MailerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// development, staging or production
    pub env: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    pub rps: f64,
    pub burst: u32,
    pub enabled: bool,
    pub sweep_interval_secs: u64,
    pub idle_multiple: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// memory or postgres
    pub backend: String,
    pub dsn: Option<String>,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub max_idle_time_secs: u64,
    /// Deadline for every store call
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokensConfig {
    pub activation_ttl_secs: i64,
    pub authentication_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Empty allows any origin
    pub trusted_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    pub sender: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            env: "development".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            rps: 2.0,
            burst: 4,
            enabled: true,
            sweep_interval_secs: 60,
            idle_multiple: 3,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            dsn: None,
            max_open_conns: 25,
            max_idle_conns: 25,
            max_idle_time_secs: 900,
            timeout_secs: 3,
        }
    }
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            activation_ttl_secs: 3 * 24 * 60 * 60,
            authentication_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            sender: "Greenlight <no-reply@greenlight.local>".to_string(),
        }
    }
}

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Slowest accepted refill rate (one permit a day)
pub const MIN_LIMITER_RPS: f64 = 1.0 / (24.0 * 60.0 * 60.0);

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("limiter.rps must be greater than zero")]
    NonPositiveRate,
    #[error("limiter.rps must allow at least one request a day")]
    RateTooSlow,
    #[error("limiter.burst must be at least 1")]
    ZeroBurst,
    #[error("limiter.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,
    #[error("limiter.idle_multiple must be at least 1")]
    ZeroIdleMultiple,
    #[error("token TTLs must be positive")]
    NonPositiveTtl,
    #[error("token TTLs must not exceed one year")]
    TtlTooLarge,
    #[error("storage.timeout_secs must be greater than zero")]
    ZeroStoreTimeout,
    #[error("unknown storage backend '{0}'")]
    UnknownBackend(String),
    #[error("storage.dsn is required for the postgres backend")]
    MissingDsn,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let limiter = &self.limiter;
        // Written so that NaN fails too
        if !(limiter.rps > 0.0) {
            return Err(ConfigValidationError::NonPositiveRate);
        }
        if limiter.rps < MIN_LIMITER_RPS {
            return Err(ConfigValidationError::RateTooSlow);
        }
        if limiter.burst == 0 {
            return Err(ConfigValidationError::ZeroBurst);
        }
        if limiter.sweep_interval_secs == 0 {
            return Err(ConfigValidationError::ZeroSweepInterval);
        }
        if limiter.idle_multiple == 0 {
            return Err(ConfigValidationError::ZeroIdleMultiple);
        }
        if self.tokens.activation_ttl_secs <= 0 || self.tokens.authentication_ttl_secs <= 0 {
            return Err(ConfigValidationError::NonPositiveTtl);
        }
        if self.tokens.activation_ttl_secs > MAX_TOKEN_TTL_SECS
            || self.tokens.authentication_ttl_secs > MAX_TOKEN_TTL_SECS
        {
            return Err(ConfigValidationError::TtlTooLarge);
        }
        if self.storage.timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroStoreTimeout);
        }

        self.storage_config().map(|_| ())
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            rate: self.limiter.rps,
            burst: self.limiter.burst,
            enabled: self.limiter.enabled,
            sweep_interval: Duration::from_secs(self.limiter.sweep_interval_secs),
            idle_multiple: self.limiter.idle_multiple,
        }
    }

    /// Token lifetimes, clamped to [`MAX_TOKEN_TTL_SECS`]
    pub fn token_ttls(&self) -> TokenTtls {
        TokenTtls {
            activation: ttl_from_secs(self.tokens.activation_ttl_secs),
            authentication: ttl_from_secs(self.tokens.authentication_ttl_secs),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.storage.timeout_secs)
    }

    pub fn storage_config(&self) -> Result<StorageConfig, ConfigValidationError> {
        let storage = &self.storage;

        match StorageType::from_str(&storage.backend) {
            Some(StorageType::InMemory) => Ok(StorageConfig::InMemory),
            Some(StorageType::Postgres) => {
                let dsn = storage
                    .dsn
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .ok_or(ConfigValidationError::MissingDsn)?;

                Ok(StorageConfig::Postgres(
                    PostgresConfig::new(dsn)
                        .with_max_connections(storage.max_open_conns)
                        .with_min_connections(storage.max_idle_conns)
                        .with_idle_timeout(storage.max_idle_time_secs),
                ))
            }
            None => Err(ConfigValidationError::UnknownBackend(storage.backend.clone())),
        }
    }
}

fn ttl_from_secs(secs: i64) -> chrono::Duration {
    let max = chrono::Duration::seconds(MAX_TOKEN_TTL_SECS);
    chrono::Duration::try_seconds(secs)
        .filter(|ttl| *ttl <= max)
        .unwrap_or(max)
}
