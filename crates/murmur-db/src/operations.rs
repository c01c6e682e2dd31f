//! Database CRUD operations.

pub mod documents;
pub mod drafts;
pub mod fragments;
pub mod interactions;
pub mod stats;

use chrono::{DateTime, Utc};

/// Parse an RFC3339 timestamp column, falling back to now on corruption.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse an optional RFC3339 timestamp column.
pub(crate) fn parse_opt_timestamp(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
