//! Counter service trait and error types.

use async_trait::async_trait;

/// Errors that can occur while talking to the counter backend.
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("Counter connection error: {0}")]
    ConnectionError(String),

    #[error("Counter operation error: {0}")]
    OperationError(String),
}

/// Result type for counter operations.
pub type CounterResult<T> = Result<T, CounterError>;

/// An atomic, durable, monotonically increasing counter.
///
/// Every call to [`BlockCounter::increment_and_get`] for the same key must return
/// a value exactly one greater than the previous call, across every process that
/// shares the backend. The first call on a fresh key returns `1`.
///
/// # Implementations
///
/// - [`crate::infrastructure::counter::RedisBlockCounter`] - `INCR` on a Redis key
/// - [`crate::infrastructure::counter::PgBlockCounter`] - upsert on the `id_counters` table
/// - [`crate::infrastructure::counter::InMemoryBlockCounter`] - single process only
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockCounter: Send + Sync {
    /// Atomically increments the counter stored under `key` and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError`] when the backend is unreachable or replies with
    /// something that is not a non-negative integer.
    async fn increment_and_get(&self, key: &str) -> CounterResult<u64>;

    /// Reads the current value without incrementing it. Missing keys read as `0`.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError`] when the backend is unreachable.
    async fn current(&self, key: &str) -> CounterResult<u64>;

    /// Checks if the counter backend is reachable.
    async fn health_check(&self) -> bool;
}
