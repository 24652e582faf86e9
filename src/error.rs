//! Error types for tapi.
//!
//! Defines a unified error type that maps cleanly to HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error type for tapi operations.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for TodoError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => {
                TodoError::StoreUnavailable("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                TodoError::StoreUnavailable("connection pool is closed".to_string())
            }
            sqlx::Error::Io(e) => TodoError::StoreUnavailable(e.to_string()),
            sqlx::Error::Tls(e) => TodoError::StoreUnavailable(e.to_string()),
            other => TodoError::Database(other),
        }
    }
}

impl From<JsonRejection> for TodoError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(e) => TodoError::MalformedRequest(e.body_text()),
            JsonRejection::MissingJsonContentType(e) => {
                TodoError::UnsupportedMediaType(e.body_text())
            }
            JsonRejection::JsonDataError(e) => TodoError::InvalidArgument(e.body_text()),
            other => TodoError::MalformedRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for TodoError {
    fn from(rejection: QueryRejection) -> Self {
        TodoError::InvalidArgument(rejection.body_text())
    }
}

/// Error response body for API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            TodoError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            TodoError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            TodoError::InvalidArgument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_ARGUMENT",
                msg.clone(),
            ),
            TodoError::MalformedRequest(msg) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", msg.clone())
            }
            TodoError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            TodoError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            TodoError::StoreUnavailable(msg) => {
                tracing::warn!(error = %msg, "Backing store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "The backing store is unavailable, retry later".to_string(),
                )
            }
            TodoError::Database(e) => {
                // Log the actual error but don't expose internals
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            TodoError::Serialization(e) => {
                tracing::error!(error = %e, "Serialization error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERIALIZATION_ERROR",
                    "Failed to process stored record".to_string(),
                )
            }
            TodoError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for tapi operations.
pub type TodoResult<T> = Result<T, TodoError>;
