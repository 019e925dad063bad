//! Short URL creation and resolution service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, error, warn};

use crate::domain::allocator::{AllocatorError, BlockAllocator};
use crate::domain::entities::{NewShortUrl, ShortUrl, short_url::MAX_CODE_LEN};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::{ServiceError, StoreError};
use crate::infrastructure::cache::CacheService;
use crate::utils::base62;

/// Cache lifetime of a resolved mapping unless configured otherwise.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// Primary key constraint of `short_urls`; a hit here is never the caller's fault.
const PRIMARY_KEY_CONSTRAINT: &str = "short_urls_pkey";

/// How many consecutive generated codes may turn out to be taken by aliases
/// before `shorten` gives up on the request.
const MAX_SQUATTED_SKIPS: usize = 16;

/// Service for creating short URLs and resolving them back.
///
/// Writes go to the durable store first and to the cache second; reads try the
/// cache first, fall back to the store, and backfill the cache on the way out.
pub struct ShortUrlService<R: ShortUrlRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    allocator: Arc<BlockAllocator>,
    cache_ttl_seconds: u64,
}

impl<R: ShortUrlRepository + ?Sized> ShortUrlService<R> {
    /// Creates a new service using [`DEFAULT_CACHE_TTL_SECONDS`].
    pub fn new(
        repository: Arc<R>,
        cache: Arc<dyn CacheService>,
        allocator: Arc<BlockAllocator>,
    ) -> Self {
        Self {
            repository,
            cache,
            allocator,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    /// Overrides the cache TTL.
    pub fn with_cache_ttl(mut self, seconds: u64) -> Self {
        self.cache_ttl_seconds = seconds;
        self
    }

    /// Creates a short URL and returns its code.
    ///
    /// Every record gets a freshly allocated id as primary key. The code is the
    /// custom alias when one is given, otherwise the base62 encoding of the id.
    ///
    /// Aliases share the generated alphabet, so an alias can occupy the code a
    /// later id encodes to. Such an id is skipped and the next one is tried.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidInput`] if the URL is empty or the alias is empty,
    ///   too long, or not alphanumeric
    /// - [`ServiceError::AllocatorExhausted`] if no id could be allocated, or too
    ///   many generated codes in a row were already taken by aliases
    /// - [`ServiceError::AliasTaken`] if the custom alias is already in use
    /// - [`ServiceError::UnexpectedCollision`] if an allocated id was already
    ///   stored, which means the allocator reissued it
    /// - [`ServiceError::Store`] on other database errors
    ///
    /// A failure to write the cache after the record was stored is logged and
    /// otherwise ignored.
    pub async fn shorten(
        &self,
        long_url: String,
        custom_alias: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String, ServiceError> {
        validate_input(&long_url, custom_alias.as_deref())?;

        let is_custom = custom_alias.is_some();
        let mut skipped = 0;

        let record = loop {
            let id = self.allocator.next_id().await?;
            let id = i64::try_from(id).map_err(|_| AllocatorError::Exhausted {
                reason: format!("id {} does not fit the storage range", id),
            })?;

            let short_code = match &custom_alias {
                Some(alias) => alias.clone(),
                None => base62::encode(id as u64),
            };

            let new_short_url = NewShortUrl {
                id,
                short_code: short_code.clone(),
                long_url: long_url.clone(),
                expires_at,
            };

            let constraint = match self.repository.insert(new_short_url).await {
                Ok(record) => break record,
                Err(StoreError::UniqueViolation { constraint }) => constraint,
                Err(e) => return Err(e.into()),
            };

            let on_code = constraint.as_deref() != Some(PRIMARY_KEY_CONSTRAINT);
            if is_custom || !on_code || !self.is_squatted(&short_code, id).await? {
                return Err(self.classify_conflict(short_code, id, is_custom, constraint));
            }

            counter!("squatted_codes_skipped_total").increment(1);
            skipped += 1;
            if skipped > MAX_SQUATTED_SKIPS {
                return Err(AllocatorError::Exhausted {
                    reason: format!(
                        "{} consecutive generated codes are taken by aliases",
                        skipped
                    ),
                }
                .into());
            }
            warn!(short_code = %short_code, id, "Generated code is taken by an alias, skipping id");
        };

        if let Some(ttl) = self.cache_ttl_for(&record, Utc::now())
            && let Err(e) = self
                .cache
                .set_url(&record.short_code, &record.long_url, ttl)
                .await
        {
            warn!(
                "Stored {} but failed to cache it, reads will fall back to the database: {}",
                record.short_code, e
            );
        }

        debug!("Created {} -> {} (id {})", record.short_code, record.long_url, record.id);
        Ok(record.short_code)
    }

    /// Resolves a short code to its long URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] if no record exists or it has expired.
    /// Cache and database failures are returned as [`ServiceError::Cache`] and
    /// [`ServiceError::Store`].
    pub async fn resolve(&self, short_code: &str) -> Result<String, ServiceError> {
        self.resolve_at(short_code, Utc::now()).await
    }

    /// Resolves a short code, judging expiry against `now`.
    ///
    /// A cache hit is trusted as is. Entries are only ever cached with a TTL that
    /// ends no later than the record's expiry (see [`Self::cache_ttl_for`]).
    pub async fn resolve_at(
        &self,
        short_code: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        if short_code.is_empty() || short_code.len() > MAX_CODE_LEN {
            return Err(ServiceError::NotFound);
        }

        if let Some(url) = self.cache.get_url(short_code).await? {
            counter!("cache_hits_total").increment(1);
            debug!("Cache HIT: {}", short_code);
            return Ok(url);
        }
        counter!("cache_misses_total").increment(1);
        debug!("Cache MISS: {}", short_code);

        let record = self
            .repository
            .find_by_code(short_code)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if record.is_expired_at(now) {
            debug!("{} expired at {:?}", short_code, record.expires_at);
            return Err(ServiceError::NotFound);
        }

        if let Some(ttl) = self.cache_ttl_for(&record, now) {
            self.cache
                .set_url(short_code, &record.long_url, ttl)
                .await?;
        }

        Ok(record.long_url)
    }

    /// Cache TTL for a record, in whole seconds.
    ///
    /// `min(cache_ttl, time until expiry)`, rounded down. Returns `None` when the
    /// record expires in less than a second, in which case it is not cached.
    pub fn cache_ttl_for(&self, record: &ShortUrl, now: DateTime<Utc>) -> Option<u64> {
        let Some(expires_at) = record.expires_at else {
            return Some(self.cache_ttl_seconds);
        };

        let remaining = (expires_at - now).num_seconds();
        if remaining < 1 {
            return None;
        }
        Some(self.cache_ttl_seconds.min(remaining as u64))
    }

    /// Whether `short_code`, generated from `id`, is held by a record with a
    /// different id.
    ///
    /// Encoding is injective and never yields leading zeros, so a holder with
    /// another id must have been created with a custom alias.
    async fn is_squatted(&self, short_code: &str, id: i64) -> Result<bool, ServiceError> {
        let holder = self.repository.find_by_code(short_code).await?;
        Ok(holder.is_some_and(|holder| holder.id != id))
    }

    fn classify_conflict(
        &self,
        short_code: String,
        id: i64,
        is_custom: bool,
        constraint: Option<String>,
    ) -> ServiceError {
        if is_custom && constraint.as_deref() != Some(PRIMARY_KEY_CONSTRAINT) {
            debug!("Alias {} is already taken", short_code);
            return ServiceError::AliasTaken(short_code);
        }

        counter!("unexpected_collisions_total").increment(1);
        error!(
            short_code = %short_code,
            id,
            constraint = constraint.as_deref().unwrap_or("unknown"),
            "Unexpected collision on allocated id: allocator or encoding is corrupted"
        );
        ServiceError::UnexpectedCollision(short_code)
    }
}

/// Minimal checks that keep obviously bad input from consuming an id.
fn validate_input(long_url: &str, custom_alias: Option<&str>) -> Result<(), ServiceError> {
    if long_url.trim().is_empty() {
        return Err(ServiceError::InvalidInput("long URL is empty".to_string()));
    }

    if let Some(alias) = custom_alias {
        if alias.is_empty() || alias.len() > MAX_CODE_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "alias must be 1-{} characters",
                MAX_CODE_LEN
            )));
        }
        if !base62::is_base62(alias) {
            return Err(ServiceError::InvalidInput(
                "alias may only contain 0-9, a-z and A-Z".to_string(),
            ));
        }
    }

    Ok(())
}
