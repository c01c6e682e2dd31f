//! Draft artifact storage and the DraftSink implementation.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::Utc;
use murmur_core::{
    ArtifactId, Draft, DraftKind, DraftLinkage, DraftSink, DraftStatus,
};
use rusqlite::params;

fn draft_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draft> {
    let kind_str: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    let linkage_str: Option<String> = row.get(4)?;
    let created_at_str: String = row.get(6)?;
    let posted_at_str: Option<String> = row.get(7)?;

    Ok(Draft {
        id: row.get(0)?,
        content: row.get(1)?,
        kind: DraftKind::from_str(&kind_str).unwrap_or(DraftKind::Post),
        status: DraftStatus::from_str(&status_str).unwrap_or_default(),
        linkage: linkage_str.and_then(|s| DraftLinkage::parse(&s)),
        external_post_id: row.get(5)?,
        created_at: super::parse_timestamp(&created_at_str),
        posted_at: super::parse_opt_timestamp(posted_at_str),
    })
}

const DRAFT_COLUMNS: &str =
    "id, content, kind, status, linkage, external_post_id, created_at, posted_at";

impl Database {
    /// Insert a draft artifact.
    pub fn insert_draft(&self, draft: &Draft) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO drafts
                (id, content, kind, status, linkage, external_post_id, created_at, posted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                draft.id,
                draft.content,
                draft.kind.as_str(),
                draft.status.as_str(),
                draft.linkage.as_ref().map(|l| l.as_string()),
                draft.external_post_id,
                draft.created_at.to_rfc3339(),
                draft.posted_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get a draft by ID.
    pub fn get_draft(&self, id: &str) -> DbResult<Draft> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE id = ?1"),
            params![id],
            draft_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("Draft not found: {}", id))
            }
            _ => DbError::from(e),
        })
    }

    /// List drafts, newest first, optionally filtered by status.
    pub fn list_drafts(&self, status: Option<DraftStatus>, limit: usize) -> DbResult<Vec<Draft>> {
        let conn = self.conn()?;

        let mut results = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {DRAFT_COLUMNS} FROM drafts
                     WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![status.as_str(), limit as i64], draft_from_row)?;
                for row in rows {
                    results.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {DRAFT_COLUMNS} FROM drafts ORDER BY created_at DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit as i64], draft_from_row)?;
                for row in rows {
                    results.push(row?);
                }
            }
        }

        Ok(results)
    }

    /// Mark a draft as successfully published.
    pub fn mark_draft_posted(&self, id: &str, external_post_id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            r#"
            UPDATE drafts
            SET status = 'posted', posted_at = ?2, external_post_id = ?3
            WHERE id = ?1
            "#,
            params![id, Utc::now().to_rfc3339(), external_post_id],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Draft not found: {}", id)));
        }

        Ok(())
    }

    /// Discard a draft.
    pub fn discard_draft(&self, id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE drafts SET status = 'discarded' WHERE id = ?1",
            params![id],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Draft not found: {}", id)));
        }

        Ok(())
    }

    /// Find a published draft by its external post id. Used to decide
    /// whether an inbound reply is a comment on our own content.
    pub fn find_draft_by_external_post(&self, external_post_id: &str) -> DbResult<Option<Draft>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE external_post_id = ?1"),
            params![external_post_id],
            draft_from_row,
        );

        match result {
            Ok(draft) => Ok(Some(draft)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }
}

/// DraftSink over the drafts table.
#[derive(Clone)]
pub struct DraftStore {
    db: Database,
}

impl DraftStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl DraftSink for DraftStore {
    fn save_draft(
        &self,
        text: &str,
        kind: DraftKind,
        linkage: DraftLinkage,
    ) -> murmur_core::Result<ArtifactId> {
        let draft = Draft::new(text, kind).with_linkage(linkage);
        self.db.insert_draft(&draft)?;
        Ok(draft.id)
    }
}
