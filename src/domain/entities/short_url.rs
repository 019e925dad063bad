//! Short URL entity representing a persisted code to URL mapping.

use chrono::{DateTime, Utc};

/// Maximum length of a short code, generated or custom.
pub const MAX_CODE_LEN: usize = 20;

/// A shortened URL record.
///
/// Created once at shorten time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrl {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortUrl {
    /// Creates a new ShortUrl instance.
    pub fn new(
        id: i64,
        short_code: String,
        long_url: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            short_code,
            long_url,
            created_at,
            expires_at,
        }
    }

    /// Returns true if the record has expired as of `now`.
    ///
    /// A record whose expiry equals `now` is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the record has expired as of the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for creating a new short URL record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortUrl {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: Option<DateTime<Utc>>) -> ShortUrl {
        ShortUrl::new(
            1000,
            "g8".to_string(),
            "https://example.com".to_string(),
            Utc::now(),
            expires_at,
        )
    }

    #[test]
    fn test_short_url_creation() {
        let now = Utc::now();
        let short_url = ShortUrl::new(
            1,
            "1".to_string(),
            "https://example.com".to_string(),
            now,
            None,
        );

        assert_eq!(short_url.id, 1);
        assert_eq!(short_url.short_code, "1");
        assert_eq!(short_url.long_url, "https://example.com");
        assert_eq!(short_url.created_at, now);
        assert!(!short_url.is_expired());
    }

    #[test]
    fn test_short_url_is_expired() {
        let short_url = record(Some(Utc::now() - Duration::seconds(1)));
        assert!(short_url.is_expired());
    }

    #[test]
    fn test_short_url_future_expiry_is_not_expired() {
        let short_url = record(Some(Utc::now() + Duration::hours(1)));
        assert!(!short_url.is_expired());
    }

    #[test]
    fn test_short_url_expires_at_boundary() {
        let at = Utc::now();
        let short_url = record(Some(at));

        assert!(short_url.is_expired_at(at));
        assert!(!short_url.is_expired_at(at - Duration::milliseconds(1)));
    }
}
