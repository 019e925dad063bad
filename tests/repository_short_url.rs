mod common;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tinyurl::domain::entities::NewShortUrl;
use tinyurl::domain::repositories::ShortUrlRepository;
use tinyurl::error::StoreError;
use tinyurl::infrastructure::counter::{BlockCounter, PgBlockCounter};
use tinyurl::infrastructure::persistence::{PgShortUrlRepository, RecordCounts};

fn new_short_url(id: i64, code: &str) -> NewShortUrl {
    NewShortUrl {
        id,
        short_code: code.to_string(),
        long_url: "https://example.com".to_string(),
        expires_at: None,
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_and_find(pool: PgPool) {
    let repo = PgShortUrlRepository::new(Arc::new(pool));

    let created = repo.insert(new_short_url(1000, "g8")).await.unwrap();
    assert_eq!(created.id, 1000);
    assert_eq!(created.short_code, "g8");
    assert!(created.expires_at.is_none());

    let found = repo.find_by_code("g8").await.unwrap().unwrap();
    assert_eq!(found, created);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_find_missing_code(pool: PgPool) {
    let repo = PgShortUrlRepository::new(Arc::new(pool));

    assert!(repo.find_by_code("nope").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_find_is_case_sensitive(pool: PgPool) {
    let repo = PgShortUrlRepository::new(Arc::new(pool));
    repo.insert(new_short_url(1, "abc")).await.unwrap();

    assert!(repo.find_by_code("ABC").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_code_reports_constraint(pool: PgPool) {
    let repo = PgShortUrlRepository::new(Arc::new(pool));
    repo.insert(new_short_url(1, "promo")).await.unwrap();

    let err = repo.insert(new_short_url(2, "promo")).await.unwrap_err();

    match err {
        StoreError::UniqueViolation { constraint } => {
            assert_eq!(constraint.as_deref(), Some("short_urls_short_code_key"))
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_id_reports_primary_key(pool: PgPool) {
    let repo = PgShortUrlRepository::new(Arc::new(pool));
    repo.insert(new_short_url(7, "a")).await.unwrap();

    let err = repo.insert(new_short_url(7, "b")).await.unwrap_err();

    match err {
        StoreError::UniqueViolation { constraint } => {
            assert_eq!(constraint.as_deref(), Some("short_urls_pkey"))
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_count_and_purge_expired(pool: PgPool) {
    let repo = PgShortUrlRepository::new(Arc::new(pool));
    let now = Utc::now();

    repo.insert(new_short_url(1, "keep")).await.unwrap();
    repo.insert(NewShortUrl {
        expires_at: Some(now + Duration::days(1)),
        ..new_short_url(2, "later")
    })
    .await
    .unwrap();
    repo.insert(NewShortUrl {
        expires_at: Some(now - Duration::hours(1)),
        ..new_short_url(3, "gone")
    })
    .await
    .unwrap();

    assert_eq!(
        repo.count_records(now).await.unwrap(),
        RecordCounts {
            total: 3,
            expired: 1
        }
    );

    assert_eq!(repo.purge_expired(now).await.unwrap(), 1);
    assert!(repo.find_by_code("gone").await.unwrap().is_none());
    assert!(repo.find_by_code("later").await.unwrap().is_some());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    let repo = PgShortUrlRepository::new(Arc::new(pool));
    assert!(repo.health_check().await);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_block_counter_increments_from_one(pool: PgPool) {
    let counter = PgBlockCounter::new(Arc::new(pool));

    assert_eq!(counter.current("blocks").await.unwrap(), 0);
    assert_eq!(counter.increment_and_get("blocks").await.unwrap(), 1);
    assert_eq!(counter.increment_and_get("blocks").await.unwrap(), 2);
    assert_eq!(counter.increment_and_get("other").await.unwrap(), 1);
    assert_eq!(counter.current("blocks").await.unwrap(), 2);
    assert!(counter.health_check().await);
}
