//! Error types for the storage, service and HTTP layers.
//!
//! - [`StoreError`] - durable store failures, with unique violations kept distinct
//! - [`ServiceError`] - outcome taxonomy of [`crate::application::services::ShortUrlService`]
//! - [`AppError`] - HTTP-facing error rendered as a JSON body

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::allocator::AllocatorError;
use crate::infrastructure::cache::CacheError;

/// Errors raised by the durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An insert hit a unique constraint.
    #[error("Unique constraint violation ({})", .constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return Self::UniqueViolation {
                constraint: db.constraint().map(str::to_string),
            };
        }

        Self::Database(e)
    }
}

/// Errors returned by the shorten and resolve operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    AllocatorExhausted(#[from] AllocatorError),

    /// A caller-supplied alias is already in use.
    #[error("Alias '{0}' is already taken")]
    AliasTaken(String),

    /// A generated code already existed. The allocator guarantees unique ids,
    /// so this points at allocator or encoding corruption.
    #[error("Generated short code '{0}' collided with an existing record")]
    UnexpectedCollision(String),

    #[error("Short URL not found or expired")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// HTTP-facing application error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    Unavailable { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Converts the error into its status code and JSON payload.
    pub fn to_error_info(self) -> (StatusCode, ErrorInfo) {
        let (status, code, message, details) = match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Conflict { message, details } => {
                (StatusCode::CONFLICT, "conflict", message, details)
            }
            AppError::Unavailable { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                message,
                details,
            ),
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        };

        (
            status,
            ErrorInfo {
                code,
                message,
                details,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.to_error_info();
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidInput(reason) => {
                AppError::bad_request("Invalid input", json!({ "reason": reason }))
            }
            ServiceError::AliasTaken(alias) => {
                AppError::conflict("Alias already taken", json!({ "alias": alias }))
            }
            ServiceError::NotFound => AppError::not_found("URL not found or expired", json!({})),
            ServiceError::AllocatorExhausted(_) => AppError::unavailable(
                "Short code allocation is temporarily unavailable",
                json!({ "retryable": true }),
            ),
            ServiceError::UnexpectedCollision(_) => {
                AppError::internal("Short code collision", json!({}))
            }
            ServiceError::Store(_) => AppError::internal("Database error", json!({})),
            ServiceError::Cache(_) => AppError::internal("Cache error", json!({})),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
        AppError::bad_request("Validation failed", details)
    }
}
