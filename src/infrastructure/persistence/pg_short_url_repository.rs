//! PostgreSQL implementation of the short URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::StoreError;

/// Row shape of the `short_urls` table.
#[derive(sqlx::FromRow)]
struct ShortUrlRow {
    id: i64,
    short_code: String,
    long_url: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<ShortUrlRow> for ShortUrl {
    fn from(r: ShortUrlRow) -> Self {
        ShortUrl::new(r.id, r.short_code, r.long_url, r.created_at, r.expires_at)
    }
}

/// PostgreSQL repository for short URL records.
///
/// Uniqueness of `short_code` is enforced by the `short_urls_short_code_key`
/// constraint; a violation surfaces as [`StoreError::UniqueViolation`].
pub struct PgShortUrlRepository {
    pool: Arc<PgPool>,
}

impl PgShortUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Counts all records and those expired as of `now`.
    pub async fn count_records(&self, now: DateTime<Utc>) -> Result<RecordCounts, StoreError> {
        let (total, expired): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE expires_at IS NOT NULL AND expires_at <= $1)
            FROM short_urls
            "#,
        )
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(RecordCounts { total, expired })
    }

    /// Deletes records expired as of `now` and returns how many were removed.
    ///
    /// Cached entries need no invalidation: their TTL never outlives the record's expiry.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM short_urls WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}

/// Record totals reported by the admin tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCounts {
    pub total: i64,
    pub expired: i64,
}

#[async_trait]
impl ShortUrlRepository for PgShortUrlRepository {
    async fn insert(&self, new_short_url: NewShortUrl) -> Result<ShortUrl, StoreError> {
        let row = sqlx::query_as::<_, ShortUrlRow>(
            r#"
            INSERT INTO short_urls (id, short_code, long_url, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, short_code, long_url, created_at, expires_at
            "#,
        )
        .bind(new_short_url.id)
        .bind(&new_short_url.short_code)
        .bind(&new_short_url.long_url)
        .bind(new_short_url.expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, StoreError> {
        let row = sqlx::query_as::<_, ShortUrlRow>(
            r#"
            SELECT id, short_code, long_url, created_at, expires_at
            FROM short_urls
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ShortUrl::from))
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
