//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` through the repository
/// 2. **Cache**: PING, always ok when caching is disabled
/// 3. **Id counter**: reachability of the block counter backend
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (db_ok, cache_ok, counter_ok) = tokio::join!(
        state.repository.health_check(),
        state.cache.health_check(),
        state.counter.health_check(),
    );

    let checks = HealthChecks {
        database: CheckStatus::from_check(db_ok, "Connected", "Database unreachable"),
        cache: CheckStatus::from_check(cache_ok, "Connected", "Cache unreachable"),
        id_counter: CheckStatus::from_check(counter_ok, "Connected", "Id counter unreachable"),
    };

    let all_healthy = checks.database.is_ok() && checks.cache.is_ok() && checks.id_counter.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
