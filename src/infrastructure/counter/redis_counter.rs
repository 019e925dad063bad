//! Redis-backed block counter.

use super::service::{BlockCounter, CounterError, CounterResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

/// Block counter using Redis `INCR`, which is atomic on the server.
///
/// Redis persistence (RDB/AOF) is what makes the counter survive restarts; a
/// Redis instance without persistence can hand out blocks twice after a crash.
pub struct RedisBlockCounter {
    client: ConnectionManager,
}

impl RedisBlockCounter {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ConnectionError`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> CounterResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CounterError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CounterError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        Self::from_manager(manager).await
    }

    /// Builds a counter on top of an existing connection manager.
    ///
    /// Lets the counter share one multiplexed connection with [`crate::infrastructure::cache::RedisCache`].
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ConnectionError`] if the PING fails.
    pub async fn from_manager(manager: ConnectionManager) -> CounterResult<Self> {
        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CounterError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Block counter backed by Redis");

        Ok(Self { client: manager })
    }
}

#[async_trait]
impl BlockCounter for RedisBlockCounter {
    async fn increment_and_get(&self, key: &str) -> CounterResult<u64> {
        let mut conn = self.client.clone();

        let value = conn
            .incr::<_, _, u64>(key, 1u64)
            .await
            .map_err(|e| CounterError::OperationError(format!("Redis INCR {}: {}", key, e)))?;

        debug!("Counter INCR: {} -> {}", key, value);
        Ok(value)
    }

    async fn current(&self, key: &str) -> CounterResult<u64> {
        let mut conn = self.client.clone();

        let value = conn
            .get::<_, Option<u64>>(key)
            .await
            .map_err(|e| CounterError::OperationError(format!("Redis GET {}: {}", key, e)))?;

        Ok(value.unwrap_or(0))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
