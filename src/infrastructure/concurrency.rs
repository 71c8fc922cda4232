//! Optimistic-locking commit protocol

use std::time::Duration;

use tracing::debug;

use crate::domain::{ConditionalUpdate, DomainError, Versioned};
use crate::infrastructure::storage::{with_deadline, DEFAULT_STORE_TIMEOUT};

/// Commits a mutated record only if nobody else wrote it first
///
/// The version check and the write happen in one store statement. A miss is
/// reported as `EditConflict`; there is no retry and no merge.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyGuard {
    store_timeout: Duration,
}

impl Default for ConcurrencyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_TIMEOUT)
    }
}

impl ConcurrencyGuard {
    pub fn new(store_timeout: Duration) -> Self {
        Self { store_timeout }
    }

    /// Write `resource` if the stored version equals `expected`
    ///
    /// On success the stored and in-memory versions both become
    /// `expected + 1`, which is returned.
    pub async fn commit_if_version_matches<T, S>(
        &self,
        store: &S,
        resource: &mut T,
        expected: i32,
    ) -> Result<i32, DomainError>
    where
        T: Versioned + Send + Sync + 'static,
        S: ConditionalUpdate<T> + ?Sized,
    {
        let outcome = with_deadline(
            self.store_timeout,
            "conditional_update",
            store.update_if_version(resource, expected),
        )
        .await?;

        match outcome {
            Some(version) => {
                resource.set_version(version);
                Ok(version)
            }
            None => {
                debug!(id = %resource.id(), expected, "Edit conflict");
                Err(DomainError::EditConflict)
            }
        }
    }
}
