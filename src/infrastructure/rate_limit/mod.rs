//! Per-client request rate limiting
//!
//! Token buckets keyed by client address, plus a cancellable background
//! sweep that forgets idle clients.

mod limiter;
mod sweeper;

pub use limiter::{Admission, RateLimitConfig, RateLimiter};
pub use sweeper::{spawn_sweeper, SweeperHandle};
