//! Background eviction of idle rate-limit state

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::limiter::RateLimiter;

/// Handle to a running sweep task
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the task and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);

        if let Err(e) = self.task.await {
            warn!(error = %e, "Rate limiter sweeper ended abnormally");
        }
    }
}

/// Run `limiter.sweep()` every sweep interval until stopped
pub fn spawn_sweeper(limiter: Arc<RateLimiter>) -> SweeperHandle {
    let (shutdown, mut signal) = watch::channel(false);
    let period = limiter.config().sweep_interval;

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = limiter.sweep().await;
                    if evicted > 0 {
                        debug!(evicted, "Evicted idle rate limit clients");
                    }
                }
                // Sender dropped counts as shutdown too
                _ = signal.changed() => break,
            }
        }

        info!("Rate limiter sweeper stopped");
    });

    SweeperHandle { shutdown, task }
}
