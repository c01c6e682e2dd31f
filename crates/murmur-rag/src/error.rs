//! Error types for the RAG pipeline.

use thiserror::Error;

/// Errors that can occur during chunking, retrieval, or sync.
#[derive(Error, Debug)]
pub enum RagError {
    /// Bad caller-supplied parameters. Fatal to the call, never retried.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A collaborator (embedder, generator) failed.
    #[error(transparent)]
    Collaborator(#[from] murmur_core::Error),

    /// Storage failed.
    #[error("Database error: {0}")]
    Database(#[from] murmur_db::DbError),
}

/// Result type for RAG operations.
pub type RagResult<T> = Result<T, RagError>;
