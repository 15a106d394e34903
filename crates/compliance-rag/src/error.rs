//! Error types for the compliance RAG service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for compliance RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Compliance RAG errors
///
/// Only `Unauthorized`, `InvalidInput` and `Service` are expected to reach a caller
/// of the query pipeline. The remaining variants come from collaborators (storage,
/// generation, retrieval) and are absorbed by the pipeline's fallback paths, but
/// still surface from the file-management endpoints.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid bearer credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rejected request input (empty question, missing file, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generation failed on both the primary and the fallback attempt
    #[error("Service failure: {0}")]
    Service(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Unsupported file type on upload
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Generation client error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Semantic retrieval error
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg.clone()),
            Error::Service(msg) => (StatusCode::BAD_GATEWAY, "service_error", msg.clone()),
            Error::Config(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone())
            }
            Error::Storage(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg.clone())
            }
            Error::DocumentNotFound(path) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Document not found: {}", path),
            ),
            Error::UnsupportedFileType(msg) => {
                (StatusCode::BAD_REQUEST, "unsupported_type", msg.clone())
            }
            Error::Llm(msg) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error", msg.clone()),
            Error::Retrieval(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "retrieval_error", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_visible_status_codes() {
        let unauthorized = Error::unauthorized("Missing Authorization header").into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let invalid = Error::invalid_input("Question cannot be empty").into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let service = Error::Service("generation failed twice".to_string()).into_response();
        assert_eq!(service.status(), StatusCode::BAD_GATEWAY);
    }
}
