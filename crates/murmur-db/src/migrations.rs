//! Database migrations and schema management.

use crate::error::DbResult;
use rusqlite::Connection;
use tracing::info;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> DbResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating initial database schema...");
        create_initial_schema(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database from version {} to {}",
            current_version, SCHEMA_VERSION
        );
        run_migrations(conn, current_version)?;
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> DbResult<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

fn create_initial_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- Tracked external pages, last-seen in full
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            revision_marker TEXT,
            chunk_strategy TEXT NOT NULL,
            chunk_size INTEGER NOT NULL,
            last_synced_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_synced ON documents(last_synced_at);

        -- Embedded document fragments for retrieval
        CREATE TABLE IF NOT EXISTS fragments (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            source_type TEXT NOT NULL,
            ordinal INTEGER NOT NULL,
            strategy TEXT NOT NULL,
            content TEXT NOT NULL,
            vector BLOB,
            dimensions INTEGER,
            metadata TEXT DEFAULT '{}',
            created_at TEXT NOT NULL,
            UNIQUE (source_id, source_type, ordinal)
        );

        CREATE INDEX IF NOT EXISTS idx_fragments_source ON fragments(source_id, source_type);

        -- Inbound social events, deduplicated by external_id
        CREATE TABLE IF NOT EXISTS interactions (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            in_reply_to TEXT,
            responded INTEGER NOT NULL DEFAULT 0,
            response_artifact_id TEXT,
            created_at TEXT NOT NULL,
            processed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_responded ON interactions(responded);
        CREATE INDEX IF NOT EXISTS idx_interactions_created ON interactions(created_at);

        -- Generated posts and replies awaiting review or published
        CREATE TABLE IF NOT EXISTS drafts (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            kind TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            linkage TEXT,
            external_post_id TEXT,
            created_at TEXT NOT NULL,
            posted_at TEXT,

            CHECK (status IN ('draft', 'posted', 'discarded'))
        );

        CREATE INDEX IF NOT EXISTS idx_drafts_status ON drafts(status);
        CREATE INDEX IF NOT EXISTS idx_drafts_created ON drafts(created_at);
        "#,
    )?;

    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> DbResult<()> {
    // Future migrations go here
    let _ = (conn, from_version);

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}
