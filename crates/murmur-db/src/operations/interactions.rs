//! Interaction CRUD operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::Utc;
use murmur_core::{Interaction, InteractionKind};
use rusqlite::params;

fn interaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Interaction> {
    let kind_str: String = row.get(2)?;
    let created_at_str: String = row.get(8)?;
    let processed_at_str: Option<String> = row.get(9)?;

    Ok(Interaction {
        id: row.get(0)?,
        external_id: row.get(1)?,
        kind: InteractionKind::from_str(&kind_str).unwrap_or(InteractionKind::Mention),
        author: row.get(3)?,
        content: row.get(4)?,
        in_reply_to: row.get(5)?,
        responded: row.get(6)?,
        response_artifact_id: row.get(7)?,
        created_at: super::parse_timestamp(&created_at_str),
        processed_at: super::parse_opt_timestamp(processed_at_str),
    })
}

const INTERACTION_COLUMNS: &str = "id, external_id, kind, author, content, in_reply_to, \
                                   responded, response_artifact_id, created_at, processed_at";

impl Database {
    /// Insert a new interaction. A duplicate `external_id` surfaces as
    /// `DbError::IntegrityViolation` -- callers should check
    /// [`Database::interaction_exists`] first and treat a violation as a
    /// race to investigate, not a routine skip.
    pub fn insert_interaction(&self, interaction: &Interaction) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO interactions
                (id, external_id, kind, author, content, in_reply_to,
                 responded, response_artifact_id, created_at, processed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                interaction.id,
                interaction.external_id,
                interaction.kind.as_str(),
                interaction.author,
                interaction.content,
                interaction.in_reply_to,
                interaction.responded,
                interaction.response_artifact_id,
                interaction.created_at.to_rfc3339(),
                interaction.processed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Check whether an interaction with this external id is already stored.
    pub fn interaction_exists(&self, external_id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM interactions WHERE external_id = ?1",
            params![external_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get an interaction by its external id.
    pub fn get_interaction(&self, external_id: &str) -> DbResult<Option<Interaction>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            &format!("SELECT {INTERACTION_COLUMNS} FROM interactions WHERE external_id = ?1"),
            params![external_id],
            interaction_from_row,
        );

        match result {
            Ok(interaction) => Ok(Some(interaction)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }

    /// Interactions not yet responded to, oldest first. Includes items left
    /// over from earlier ticks that failed mid-processing.
    pub fn unresponded_interactions(&self, limit: usize) -> DbResult<Vec<Interaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {INTERACTION_COLUMNS} FROM interactions
             WHERE responded = 0 ORDER BY created_at ASC LIMIT ?1"
        ))?;

        let interactions = stmt.query_map(params![limit as i64], interaction_from_row)?;
        interactions
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// Flip an interaction to responded and attach the response artifact.
    pub fn mark_interaction_responded(
        &self,
        id: &str,
        response_artifact_id: Option<&str>,
    ) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            r#"
            UPDATE interactions
            SET responded = 1, processed_at = ?2, response_artifact_id = ?3
            WHERE id = ?1
            "#,
            params![id, Utc::now().to_rfc3339(), response_artifact_id],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Interaction not found: {}", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_dedup_key() {
        let db = Database::open_in_memory().unwrap();

        let interaction = Interaction::new("109_1", InteractionKind::Mention, "@ada", "hi there");
        db.insert_interaction(&interaction).unwrap();

        assert!(db.interaction_exists("109_1").unwrap());
        assert!(!db.interaction_exists("109_2").unwrap());

        // Same external id again is an integrity violation, not a silent no-op
        let duplicate = Interaction::new("109_1", InteractionKind::Mention, "@ada", "hi there");
        let err = db.insert_interaction(&duplicate).unwrap_err();
        assert!(matches!(err, DbError::IntegrityViolation(_)));
    }

    #[test]
    fn test_unresponded_queue_and_mark() {
        let db = Database::open_in_memory().unwrap();

        let first = Interaction::new("1", InteractionKind::Mention, "@ada", "first");
        let second = Interaction::new("2", InteractionKind::Reply, "@bo", "second")
            .with_in_reply_to("0");
        db.insert_interaction(&first).unwrap();
        db.insert_interaction(&second).unwrap();

        let pending = db.unresponded_interactions(10).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].external_id, "1");

        db.mark_interaction_responded(&first.id, Some("draft-9")).unwrap();

        let pending = db.unresponded_interactions(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].external_id, "2");

        let stored = db.get_interaction("1").unwrap().unwrap();
        assert!(stored.responded);
        assert_eq!(stored.response_artifact_id.as_deref(), Some("draft-9"));
        assert!(stored.processed_at.is_some());
    }
}
