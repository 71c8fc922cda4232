//! Deadlines for store calls

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::domain::DomainError;

/// Default per-call store deadline
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Run a store call under `deadline`
///
/// Expiry is reported as `StoreUnavailable`, never as success.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = deadline.as_millis() as u64, "Store call timed out");
            Err(DomainError::store_unavailable(format!(
                "{} timed out after {:?}",
                operation, deadline
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_result() {
        let result = with_deadline(Duration::from_secs(1), "get_user", async { Ok::<_, DomainError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_store_unavailable() {
        let result: Result<(), DomainError> = with_deadline(Duration::from_millis(50), "get_user", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
    }
}
