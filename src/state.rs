//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::ShortUrlService;
use crate::domain::repositories::ShortUrlRepository;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::counter::BlockCounter;

/// Service handles and backends shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub short_url_service: Arc<ShortUrlService<dyn ShortUrlRepository>>,
    pub repository: Arc<dyn ShortUrlRepository>,
    pub cache: Arc<dyn CacheService>,
    pub counter: Arc<dyn BlockCounter>,
    /// Public prefix of short URLs, without trailing slash.
    pub base_url: String,
}

impl AppState {
    /// Builds the state from its parts.
    pub fn new(
        short_url_service: Arc<ShortUrlService<dyn ShortUrlRepository>>,
        repository: Arc<dyn ShortUrlRepository>,
        cache: Arc<dyn CacheService>,
        counter: Arc<dyn BlockCounter>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            short_url_service,
            repository,
            cache,
            counter,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Joins the base URL and a short code.
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }
}
