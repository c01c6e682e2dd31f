//! Error types for external source clients.

use thiserror::Error;

/// Errors that can occur when talking to an external source API.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Endpoint could not be reached.
    #[error("Cannot reach {base_url}")]
    Unreachable { base_url: String },

    /// Request timed out.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Response did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Parse(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
