//! Listener error types.

use thiserror::Error;

/// Errors raised while processing a single item within a tick. They are
/// caught at the item boundary, logged with the item's id and stage, and
/// never abort the enclosing tick.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error(transparent)]
    Collaborator(#[from] murmur_core::Error),

    #[error(transparent)]
    Rag(#[from] murmur_rag::RagError),

    #[error("Database error: {0}")]
    Database(#[from] murmur_db::DbError),
}

impl ListenerError {
    /// Whether this failure is a data-integrity breach that must be
    /// surfaced loudly rather than treated as a transient skip.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            ListenerError::Database(murmur_db::DbError::IntegrityViolation(_))
                | ListenerError::Collaborator(murmur_core::Error::DataIntegrity(_))
        )
    }
}

pub type ListenerResult<T> = Result<T, ListenerError>;
