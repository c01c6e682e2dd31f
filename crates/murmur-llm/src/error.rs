//! Error types for LLM API operations.

use thiserror::Error;

/// Errors that can occur when talking to the LLM API.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Request timed out.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Endpoint could not be reached.
    #[error("Cannot reach LLM API at {base_url}")]
    Unreachable { base_url: String },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response contained no usable output.
    #[error("Empty response from model")]
    EmptyResponse,

    /// Nothing left to embed after whitespace cleanup.
    #[error("Cannot embed empty text")]
    EmptyInput,

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
