//! Token bucket rate limiter

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{Clock, DomainError};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Steady-state permits per second
    pub rate: f64,
    /// Bucket capacity
    pub burst: u32,
    pub enabled: bool,
    pub sweep_interval: Duration,
    /// Clients idle longer than `sweep_interval * idle_multiple` are evicted
    pub idle_multiple: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: 2.0,
            burst: 4,
            enabled: true,
            sweep_interval: Duration::from_secs(60),
            idle_multiple: 3,
        }
    }
}

impl RateLimitConfig {
    pub fn idle_threshold(&self) -> Duration {
        self.sweep_interval * self.idle_multiple
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Allowed,
    /// Not an error: the caller answers 429
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// `Denied` as a [`DomainError::RateLimitExceeded`]
    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied { retry_after } => Err(DomainError::RateLimitExceeded { retry_after }),
        }
    }
}

#[derive(Debug, Clone)]
struct ClientRateState {
    tokens: f64,
    last_refill: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl ClientRateState {
    fn full(burst: f64, now: DateTime<Utc>) -> Self {
        Self {
            tokens: burst,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, rate: f64, burst: f64, now: DateTime<Utc>) {
        // A clock that steps backwards adds nothing
        let elapsed = (now - self.last_refill)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();

        self.tokens = (self.tokens + elapsed * rate).min(burst);
        self.last_refill = now;
    }
}

/// Per-client token bucket limiter
///
/// One lock guards the whole client map, so an admission and an eviction of
/// the same key never interleave.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Mutex<HashMap<String, ClientRateState>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Try to take one permit for `key`
    ///
    /// An unseen key starts with a full bucket.
    pub async fn admit(&self, key: &str) -> Admission {
        if !self.config.enabled {
            return Admission::Allowed;
        }

        let now = self.clock.now();
        let burst = f64::from(self.config.burst);
        let rate = self.config.rate;

        let mut clients = self.clients.lock().await;
        let state = clients
            .entry(key.to_string())
            .or_insert_with(|| ClientRateState::full(burst, now));

        state.refill(rate, burst, now);
        state.last_seen = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return Admission::Allowed;
        }

        // Saturates when the refill rate is too slow to express
        let retry_after =
            Duration::try_from_secs_f64((1.0 - state.tokens) / rate).unwrap_or(Duration::MAX);
        debug!(client = key, retry_after_ms = retry_after.as_millis() as u64, "Rate limit exceeded");
        Admission::Denied { retry_after }
    }

    /// Drop clients idle beyond the threshold, returning how many went
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let threshold = self.config.idle_threshold();

        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, state| {
            (now - state.last_seen)
                .to_std()
                .map(|idle| idle <= threshold)
                .unwrap_or(true)
        });

        before - clients.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
