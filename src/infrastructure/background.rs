//! Tracked background tasks
//!
//! Work spawned off the request path (welcome mails) is tracked so shutdown
//! can wait for it instead of dropping it mid-flight.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::error;

#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut`; a panic inside it is logged, never propagated
    pub async fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;

        // Reap finished tasks so the set does not grow without bound
        while let Some(result) = tasks.try_join_next() {
            log_outcome(result);
        }

        tasks.spawn(fut);
    }

    /// Wait for every tracked task to finish
    pub async fn wait(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            log_outcome(result);
        }
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

fn log_outcome(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "Background task panicked");
        }
    }
}
