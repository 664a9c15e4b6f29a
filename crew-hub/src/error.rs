//! Error types for crew-hub
//!
//! Module-specific error types using thiserror for clear error propagation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the crew-hub module
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from crew-common (config, serialization, ...)
    #[error(transparent)]
    Common(#[from] crew_common::Error),

    /// Malformed stored document
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Invalid request parameter or payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Username already claimed by another user
    #[error("Username taken: {0}")]
    UsernameTaken(String),

    /// Backing store change stream terminated
    #[error("Change stream closed: {0}")]
    StreamClosed(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Error::UsernameTaken(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            Error::MalformedDocument(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MALFORMED_DOCUMENT",
                msg,
            ),
            Error::Database(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                err.to_string(),
            ),
            Error::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            Error::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
            Error::StreamClosed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STREAM_CLOSED",
                msg,
            ),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience Result type using the crew-hub Error
pub type Result<T> = std::result::Result<T, Error>;
