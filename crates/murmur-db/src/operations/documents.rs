//! Document CRUD operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use murmur_core::{ChunkStrategy, Document, DocumentId};
use rusqlite::params;

fn document_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let strategy_str: String = row.get(5)?;
    let last_synced_str: String = row.get(7)?;
    let created_at_str: String = row.get(8)?;

    Ok(Document {
        id: row.get(0)?,
        source_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        revision_marker: row.get(4)?,
        strategy: ChunkStrategy::from_str(&strategy_str).unwrap_or_default(),
        chunk_size: row.get(6)?,
        last_synced_at: super::parse_timestamp(&last_synced_str),
        created_at: super::parse_timestamp(&created_at_str),
    })
}

const DOCUMENT_COLUMNS: &str = "id, source_id, title, content, revision_marker, \
                                chunk_strategy, chunk_size, last_synced_at, created_at";

impl Database {
    /// Insert a document on first sync, update it on every subsequent one.
    /// The surrogate id and created_at of an existing row are preserved.
    /// Returns the document id.
    pub fn upsert_document(&self, document: &Document) -> DbResult<DocumentId> {
        let conn = self.conn()?;

        let existing: Option<DocumentId> = conn
            .query_row(
                "SELECT id FROM documents WHERE source_id = ?1",
                params![document.source_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(DbError::from(other)),
            })?;

        match existing {
            Some(id) => {
                conn.execute(
                    r#"
                    UPDATE documents
                    SET title = ?2, content = ?3, revision_marker = ?4,
                        chunk_strategy = ?5, chunk_size = ?6, last_synced_at = ?7
                    WHERE id = ?1
                    "#,
                    params![
                        id,
                        document.title,
                        document.content,
                        document.revision_marker,
                        document.strategy.as_str(),
                        document.chunk_size,
                        document.last_synced_at.to_rfc3339(),
                    ],
                )?;
                Ok(id)
            }
            None => {
                conn.execute(
                    r#"
                    INSERT INTO documents
                        (id, source_id, title, content, revision_marker,
                         chunk_strategy, chunk_size, last_synced_at, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        document.id,
                        document.source_id,
                        document.title,
                        document.content,
                        document.revision_marker,
                        document.strategy.as_str(),
                        document.chunk_size,
                        document.last_synced_at.to_rfc3339(),
                        document.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(document.id.clone())
            }
        }
    }

    /// Update only the revision marker of a tracked document. Used when a
    /// source reports a new revision whose content turned out identical, so
    /// later polls stop re-detecting the same clock-only edit.
    pub fn update_revision_marker(&self, source_id: &str, marker: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE documents SET revision_marker = ?2 WHERE source_id = ?1",
            params![source_id, marker],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Document not found: {}", source_id)));
        }

        Ok(())
    }

    /// Get a document by its external source id.
    pub fn get_document(&self, source_id: &str) -> DbResult<Option<Document>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE source_id = ?1"),
            params![source_id],
            document_from_row,
        );

        match result {
            Ok(document) => Ok(Some(document)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }

    /// List all tracked documents, most recently synced first.
    pub fn list_documents(&self) -> DbResult<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY last_synced_at DESC"
        ))?;

        let documents = stmt.query_map([], document_from_row)?;
        documents.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}
