//! PostgreSQL-backed block counter.

use super::service::{BlockCounter, CounterError, CounterResult};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

/// Block counter stored as a row of the `id_counters` table.
///
/// The increment is a single `INSERT .. ON CONFLICT DO UPDATE` statement, so the
/// row lock taken by PostgreSQL makes it atomic across processes.
pub struct PgBlockCounter {
    pool: Arc<PgPool>,
}

impl PgBlockCounter {
    /// Creates a new counter with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockCounter for PgBlockCounter {
    async fn increment_and_get(&self, key: &str) -> CounterResult<u64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO id_counters (key, value)
            VALUES ($1, 1)
            ON CONFLICT (key) DO UPDATE SET value = id_counters.value + 1
            RETURNING value
            "#,
        )
        .bind(key)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| CounterError::OperationError(format!("Counter upsert {}: {}", key, e)))?;

        debug!("Counter INCR: {} -> {}", key, value);

        u64::try_from(value).map_err(|_| {
            CounterError::OperationError(format!("Counter {} holds negative value {}", key, value))
        })
    }

    async fn current(&self, key: &str) -> CounterResult<u64> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT value FROM id_counters WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool.as_ref())
                .await
                .map_err(|e| CounterError::OperationError(format!("Counter read {}: {}", key, e)))?;

        Ok(value.map(|v| v.max(0) as u64).unwrap_or(0))
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
