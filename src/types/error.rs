//! Error types for the snippet store
//!
//! Every component surfaces one of these immediately to its caller. The
//! fronting HTTP layer maps them onto status codes via [`SnippetError::status_code`]
//! so clients can tell "fix your request" apart from "retry later".

use hyper::StatusCode;

/// Main error type for snippet store operations
#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    /// Malformed input payload. Not retryable.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No record at the requested identifier. Not retryable.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying persistence failure. The caller may retry after backoff.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SnippetError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.to_string();
        (status, body)
    }

    /// Whether a caller may reasonably retry the failed call
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<std::io::Error> for SnippetError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for SnippetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for SnippetError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for SnippetError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Database(format!("BSON encoding failed: {}", err))
    }
}

impl From<bson::de::Error> for SnippetError {
    fn from(err: bson::de::Error) -> Self {
        Self::Database(format!("BSON decoding failed: {}", err))
    }
}

impl From<bson::oid::Error> for SnippetError {
    fn from(err: bson::oid::Error) -> Self {
        Self::Validation(format!("Invalid identifier: {}", err))
    }
}

/// Result type alias for snippet store operations
pub type Result<T> = std::result::Result<T, SnippetError>;
