//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::{debug, error};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its long URL with `302 Found`.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Lookup goes through the cache first and falls back to the database,
/// backfilling the cache on a miss. See
/// [`ShortUrlService::resolve`](crate::application::services::ShortUrlService::resolve).
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown or expired.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.short_url_service.resolve(&code).await?;

    let location = HeaderValue::try_from(long_url.as_str()).map_err(|e| {
        error!("Stored URL for {} is not a valid header value: {}", code, e);
        AppError::internal("Stored URL cannot be redirected to", json!({}))
    })?;

    debug!("Redirecting {} -> {}", code, long_url);
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}
