//! Optimistic concurrency primitives

use async_trait::async_trait;

use super::error::DomainError;

/// A mutable record carrying an integer version counter
///
/// The counter starts at 1 on insert and grows by exactly one on every
/// successful update.
pub trait Versioned {
    type Id: Copy + std::fmt::Display + Send + Sync;

    fn id(&self) -> Self::Id;
    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);
}

/// Store-side compare-and-swap on a versioned record
///
/// Implementations must check the version and write the new fields in one
/// atomic step. `Ok(None)` means no row matched `(id, expected)`, either
/// because a concurrent writer got there first or the row is gone.
#[async_trait]
pub trait ConditionalUpdate<T: Send + Sync + 'static>: Send + Sync {
    async fn update_if_version(&self, resource: &T, expected: i32)
        -> Result<Option<i32>, DomainError>;
}
