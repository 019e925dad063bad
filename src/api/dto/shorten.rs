//! DTOs for the shorten endpoint.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

/// Longest accepted long URL.
pub const MAX_URL_LEN: u64 = 2048;

/// Path segments that an alias may not shadow.
pub const RESERVED_ALIASES: &[&str] = &["api", "health"];

/// Compiled regex for custom alias validation.
static ALIAS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z]{1,20}$").unwrap());

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// Destination URL, `http` or `https` only.
    #[validate(length(max = 2048, message = "URL is too long"))]
    #[validate(url(message = "Invalid URL format"))]
    #[validate(custom(function = "validate_http_scheme"))]
    pub long_url: String,

    /// Optional caller-chosen code used instead of a generated one.
    #[validate(regex(
        path = "*ALIAS_REGEX",
        message = "Alias must be 1-20 characters of 0-9, a-z, A-Z"
    ))]
    #[validate(custom(function = "validate_not_reserved"))]
    pub custom_alias: Option<String>,

    /// Optional expiry (RFC 3339). Resolution fails from this instant on.
    pub expiration_date: Option<DateTime<Utc>>,
}

impl ShortenRequest {
    /// Rejects an expiry that is not strictly after `now`.
    pub fn check_expiration(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        match self.expiration_date {
            Some(at) if at <= now => Err(ValidationError::new("expiration_in_past")
                .with_message(Cow::Borrowed("Expiration date must be in the future"))),
            _ => Ok(()),
        }
    }
}

fn validate_http_scheme(long_url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(long_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("scheme")
            .with_message(Cow::Borrowed("Only http and https URLs can be shortened"))),
    }
}

fn validate_not_reserved(alias: &str) -> Result<(), ValidationError> {
    if RESERVED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(alias))
    {
        return Err(ValidationError::new("reserved")
            .with_message(Cow::Borrowed("Alias is reserved")));
    }
    Ok(())
}

/// Response for a created short URL.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(long_url: &str, alias: Option<&str>) -> ShortenRequest {
        ShortenRequest {
            long_url: long_url.to_string(),
            custom_alias: alias.map(str::to_string),
            expiration_date: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request("https://example.com/page", None).validate().is_ok());
        assert!(request("http://example.com", Some("promo2025")).validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let errors = request("ftp://example.com/file", None)
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("long_url"));
    }

    #[test]
    fn test_rejects_malformed_url() {
        assert!(request("not a url", None).validate().is_err());
    }

    #[test]
    fn test_rejects_overlong_url() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN as usize));
        assert!(request(&long, None).validate().is_err());
    }

    #[test]
    fn test_alias_charset_and_length() {
        assert!(request("https://example.com", Some("my-link")).validate().is_err());
        assert!(request("https://example.com", Some("")).validate().is_err());
        assert!(
            request("https://example.com", Some(&"a".repeat(21)))
                .validate()
                .is_err()
        );
        assert!(
            request("https://example.com", Some(&"a".repeat(20)))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_reserved_alias() {
        let errors = request("https://example.com", Some("health"))
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("custom_alias"));
        assert!(request("https://example.com", Some("API")).validate().is_err());
    }

    #[test]
    fn test_expiration_must_be_in_future() {
        let now = Utc::now();
        let mut req = request("https://example.com", None);
        assert!(req.check_expiration(now).is_ok());

        req.expiration_date = Some(now + Duration::hours(1));
        assert!(req.check_expiration(now).is_ok());

        req.expiration_date = Some(now);
        assert!(req.check_expiration(now).is_err());

        req.expiration_date = Some(now - Duration::seconds(1));
        assert!(req.check_expiration(now).is_err());
    }

    #[test]
    fn test_deserialize_rfc3339_expiration() {
        let req: ShortenRequest = serde_json::from_str(
            r#"{"long_url":"https://example.com","expiration_date":"2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            req.expiration_date.unwrap().to_rfc3339(),
            "2030-01-01T00:00:00+00:00"
        );
        assert!(req.custom_alias.is_none());
    }
}
