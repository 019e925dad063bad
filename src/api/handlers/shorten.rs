//! Handler for the shorten endpoint.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL for a long URL.
///
/// # Endpoint
///
/// `POST /api/v1/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "long_url": "https://example.com/page",
///   "custom_alias": "promo",                   // optional
///   "expiration_date": "2030-01-01T00:00:00Z"  // optional
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_url": "http://localhost:3000/g8",
///   "short_code": "g8"
/// }
/// ```
///
/// # Errors
///
/// - 400 if validation fails
/// - 409 if the alias is already taken
/// - 503 if no id could be allocated
/// - 500 on storage failures
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;
    payload.check_expiration(Utc::now()).map_err(|e| {
        AppError::bad_request(
            "Validation failed",
            json!({ "expiration_date": [e] }),
        )
    })?;

    let short_code = state
        .short_url_service
        .shorten(
            payload.long_url,
            payload.custom_alias,
            payload.expiration_date,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            short_url: state.short_url(&short_code),
            short_code,
        }),
    ))
}
