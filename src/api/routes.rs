//! API route configuration.

use crate::api::handlers::shorten_handler;
use crate::state::AppState;
use axum::{Router, routing::post};

/// Versioned API routes, nested under `/api/v1`.
///
/// # Endpoints
///
/// - `POST /shorten` - Create a short URL
pub fn v1_routes() -> Router<AppState> {
    Router::new().route("/shorten", post(shorten_handler))
}
