//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

/// Namespace prefix for cached short codes.
const KEY_PREFIX: &str = "url:";

/// Redis cache implementation for fast URL lookups.
///
/// Uses `ConnectionManager` for a multiplexed, auto-reconnecting connection.
/// Errors are returned to the caller rather than swallowed.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection
    /// cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self { client: manager })
    }

    /// Returns the underlying connection manager so other Redis-backed
    /// components can share the connection.
    pub fn connection(&self) -> ConnectionManager {
        self.client.clone()
    }
}

/// Constructs the full Redis key with namespace prefix.
fn build_key(short_code: &str) -> String {
    format!("{}{}", KEY_PREFIX, short_code)
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let key = build_key(short_code);
        let mut conn = self.client.clone();

        conn.get::<_, Option<String>>(&key)
            .await
            .map_err(|e| CacheError::OperationError(format!("Redis GET {}: {}", key, e)))
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl_seconds: u64,
    ) -> CacheResult<()> {
        let key = build_key(short_code);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(&key, original_url, ttl_seconds)
            .await
            .map_err(|e| CacheError::OperationError(format!("Redis SET {}: {}", key, e)))?;

        debug!(
            "Cache SET: {} -> {} (TTL: {}s)",
            short_code, original_url, ttl_seconds
        );
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key_uses_prefix() {
        assert_eq!(build_key("g8"), "url:g8");
    }
}
