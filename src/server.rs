//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and counter selection, id allocator
//! construction, and the Axum server lifecycle.

use crate::application::services::ShortUrlService;
use crate::config::Config;
use crate::domain::allocator::BlockAllocator;
use crate::domain::repositories::ShortUrlRepository;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::counter::{BlockCounter, PgBlockCounter, RedisBlockCounter};
use crate::infrastructure::persistence::PgShortUrlRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Opens the connection pool with the configured limits.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    Ok(pool)
}

/// Picks the cache and block counter backends.
///
/// With Redis configured, both live in Redis and share one connection manager.
/// Without it, caching is disabled and blocks are counted in PostgreSQL.
/// A configured but unreachable Redis is a startup error: falling back to a
/// different counter would restart block numbering from another sequence.
async fn select_backends(
    config: &Config,
    pool: Arc<PgPool>,
) -> Result<(Arc<dyn CacheService>, Arc<dyn BlockCounter>)> {
    match &config.redis_url {
        Some(redis_url) => {
            let cache = RedisCache::connect(redis_url)
                .await
                .context("Failed to connect to Redis")?;
            let counter = RedisBlockCounter::from_manager(cache.connection())
                .await
                .context("Failed to initialize Redis block counter")?;
            tracing::info!("Cache enabled (Redis), block counter in Redis");

            Ok((Arc::new(cache), Arc::new(counter)))
        }
        None => {
            tracing::info!("Cache disabled (NullCache), block counter in PostgreSQL");
            Ok((Arc::new(NullCache::new()), Arc::new(PgBlockCounter::new(pool))))
        }
    }
}

/// Wires repositories, cache, allocator and service into the shared state.
pub async fn build_state(config: &Config, pool: PgPool) -> Result<AppState> {
    let pool = Arc::new(pool);
    let (cache, counter) = select_backends(config, pool.clone()).await?;

    let allocator = BlockAllocator::new(counter.clone(), config.block_size()?)
        .with_counter_key(config.id_counter_key.clone())
        .with_fetch_retries(config.id_fetch_retries);

    let repository: Arc<dyn ShortUrlRepository> = Arc::new(PgShortUrlRepository::new(pool));
    let service = ShortUrlService::new(repository.clone(), cache.clone(), Arc::new(allocator))
        .with_cache_ttl(config.cache_ttl_seconds);

    Ok(AppState::new(
        Arc::new(service),
        repository,
        cache,
        counter,
        config.base_url.clone(),
    ))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Cache and block counter backends
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Redis is configured but unreachable
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let state = build_state(&config, pool).await?;
    let app = app_router(state, &config.cors_allowed_origins);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
