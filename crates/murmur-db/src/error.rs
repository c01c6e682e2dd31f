//! Database error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Other(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        // Uniqueness breaches indicate a write race or a bug; surface them
        // distinctly so callers never treat them as a routine failure.
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::IntegrityViolation(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => DbError::Sqlite(err),
        }
    }
}

impl From<DbError> for murmur_core::Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::IntegrityViolation(msg) => murmur_core::Error::DataIntegrity(msg),
            other => murmur_core::Error::Storage(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
