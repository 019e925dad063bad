//! Repository trait for short URL data access.

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::error::StoreError;
use async_trait::async_trait;

/// Repository interface for the durable store of short URL records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_short_url.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortUrlRepository: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if the short code (or id) is
    /// already present. Returns [`StoreError::Database`] on other database errors.
    async fn insert(&self, new_short_url: NewShortUrl) -> Result<ShortUrl, StoreError>;

    /// Finds a record by its short code, expired or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database errors.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, StoreError>;

    /// Checks if the store is reachable.
    ///
    /// Used by health check endpoints to report database status.
    async fn health_check(&self) -> bool;
}
