#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tinyurl::application::services::ShortUrlService;
use tinyurl::domain::allocator::BlockAllocator;
use tinyurl::domain::entities::{NewShortUrl, ShortUrl};
use tinyurl::domain::repositories::ShortUrlRepository;
use tinyurl::error::StoreError;
use tinyurl::infrastructure::cache::{CacheResult, CacheService};
use tinyurl::infrastructure::counter::{BlockCounter, InMemoryBlockCounter};
use tinyurl::state::AppState;

pub const BASE_URL: &str = "http://sho.rt";

/// Store that enforces the same unique constraints as the `short_urls` table.
pub struct InMemoryShortUrlRepository {
    records: Mutex<HashMap<String, ShortUrl>>,
    healthy: AtomicBool,
}

impl InMemoryShortUrlRepository {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn put(&self, record: ShortUrl) {
        self.records
            .lock()
            .unwrap()
            .insert(record.short_code.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl ShortUrlRepository for InMemoryShortUrlRepository {
    async fn insert(&self, new_short_url: NewShortUrl) -> Result<ShortUrl, StoreError> {
        let mut records = self.records.lock().unwrap();

        if records.values().any(|r| r.id == new_short_url.id) {
            return Err(StoreError::UniqueViolation {
                constraint: Some("short_urls_pkey".to_string()),
            });
        }
        if records.contains_key(&new_short_url.short_code) {
            return Err(StoreError::UniqueViolation {
                constraint: Some("short_urls_short_code_key".to_string()),
            });
        }

        let record = ShortUrl::new(
            new_short_url.id,
            new_short_url.short_code,
            new_short_url.long_url,
            Utc::now(),
            new_short_url.expires_at,
        );
        records.insert(record.short_code.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, StoreError> {
        Ok(self.records.lock().unwrap().get(short_code).cloned())
    }

    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

/// Cache that remembers every write and its TTL.
pub struct RecordingCache {
    entries: Mutex<HashMap<String, (String, u64)>>,
    healthy: AtomicBool,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn entry(&self, short_code: &str) -> Option<(String, u64)> {
        self.entries.lock().unwrap().get(short_code).cloned()
    }

    pub fn seed(&self, short_code: &str, url: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(short_code.to_string(), (url.to_string(), 3600));
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheService for RecordingCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        Ok(self.entry(short_code).map(|(url, _)| url))
    }

    async fn set_url(&self, short_code: &str, original_url: &str, ttl_seconds: u64) -> CacheResult<()> {
        self.entries.lock().unwrap().insert(
            short_code.to_string(),
            (original_url.to_string(), ttl_seconds),
        );
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

/// Handles to the fakes behind a test [`AppState`].
pub struct TestBackends {
    pub repository: Arc<InMemoryShortUrlRepository>,
    pub cache: Arc<RecordingCache>,
    pub counter: Arc<InMemoryBlockCounter>,
}

pub fn create_test_state() -> (AppState, TestBackends) {
    create_test_state_with_block_size(1000)
}

pub fn create_test_state_with_block_size(block_size: u64) -> (AppState, TestBackends) {
    let repository = Arc::new(InMemoryShortUrlRepository::new());
    let cache = Arc::new(RecordingCache::new());
    let counter = Arc::new(InMemoryBlockCounter::new());

    let allocator = BlockAllocator::new(
        counter.clone() as Arc<dyn BlockCounter>,
        NonZeroU64::new(block_size).unwrap(),
    );

    let repository_dyn: Arc<dyn ShortUrlRepository> = repository.clone();
    let cache_dyn: Arc<dyn CacheService> = cache.clone();
    let service = ShortUrlService::new(repository_dyn.clone(), cache_dyn.clone(), Arc::new(allocator));

    let state = AppState::new(
        Arc::new(service),
        repository_dyn,
        cache_dyn,
        counter.clone(),
        format!("{}/", BASE_URL),
    );

    (
        state,
        TestBackends {
            repository,
            cache,
            counter,
        },
    )
}

pub fn short_url(
    id: i64,
    short_code: &str,
    long_url: &str,
    expires_at: Option<DateTime<Utc>>,
) -> ShortUrl {
    ShortUrl::new(
        id,
        short_code.to_string(),
        long_url.to_string(),
        Utc::now(),
        expires_at,
    )
}
