//! Infrastructure layer - stores, gates and services

pub mod background;
pub mod concurrency;
pub mod logging;
pub mod mailer;
pub mod movie;
pub mod permission;
pub mod rate_limit;
pub mod storage;
pub mod token;
pub mod user;

pub use background::BackgroundTasks;
pub use concurrency::ConcurrencyGuard;
pub use mailer::{LogMailer, Mailer};
pub use permission::PermissionGate;
pub use rate_limit::{Admission, RateLimitConfig, RateLimiter};
pub use token::TokenAuthenticator;
