//! CLI command implementations.

pub mod ask;
pub mod config;
pub mod draft;
pub mod drafts;
pub mod init;
pub mod listen;
pub mod publish;
pub mod query;
pub mod stats;
pub mod sync;

use anyhow::{Context, Result};
use murmur_config::AppPaths;
use murmur_db::Database;

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Get a database connection, ensuring murmur is initialized.
pub fn get_database() -> Result<Database> {
    let paths = get_paths()?;

    if !paths.is_initialized() {
        anyhow::bail!("Murmur is not initialized. Run 'murmur init' first.");
    }

    Database::open(&paths.database_file).context("Failed to open database")
}

/// Truncate text to a single preview line.
pub fn preview(text: &str, max_len: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_len {
        flat
    } else {
        let truncated: String = flat.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
