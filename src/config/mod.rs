//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, ConfigValidationError, CorsConfig, LimiterConfig, LogFormat, LoggingConfig,
    MailerConfig, ServerConfig, StorageSettings, TokensConfig, MAX_TOKEN_TTL_SECS, MIN_LIMITER_RPS,
};
