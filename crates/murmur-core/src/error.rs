//! Error taxonomy shared across Murmur crates.

use thiserror::Error;

/// Core error type. Crate-local errors converge to these variants at the
/// collaborator seams so callers can apply a uniform retry policy:
/// `InvalidConfiguration` is fatal to the call, the `*Unavailable` /
/// `PublishFailed` variants are transient and retried by the next poll
/// cycle, and `DataIntegrity` indicates a bug or a write race.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias using Murmur's core Error.
pub type Result<T> = std::result::Result<T, Error>;
