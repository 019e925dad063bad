//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`           - Short link redirect
//! - `GET  /health`           - Health check: DB, cache, id counter
//! - `POST /api/v1/shorten`   - Create a short URL
//!
//! # Middleware
//!
//! - **CORS** - Lets browser frontends call the API
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{cors, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Routes with state and middleware applied, without path normalization.
///
/// `allowed_origins` restricts cross-origin callers; empty allows any origin.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1", api::routes::v1_routes())
        .with_state(state)
        .layer(cors::layer(allowed_origins))
        .layer(tracing::layer())
}

/// Constructs the application router with all routes and middleware.
///
/// Trailing slashes are trimmed before routing, so `/g8/` resolves like `/g8`.
pub fn app_router(state: AppState, allowed_origins: &[String]) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, allowed_origins))
}
