//! Aggregate statistics.

use crate::database::Database;
use crate::error::DbResult;
use murmur_core::KnowledgeStats;

impl Database {
    /// Get overall statistics about the knowledge base.
    pub fn get_stats(&self) -> DbResult<KnowledgeStats> {
        let conn = self.conn()?;

        let total_documents: i64 =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        let total_fragments: i64 =
            conn.query_row("SELECT COUNT(*) FROM fragments", [], |row| row.get(0))?;

        let embedded_fragments: i64 = conn.query_row(
            "SELECT COUNT(*) FROM fragments WHERE vector IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let total_interactions: i64 =
            conn.query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))?;

        let unresponded_interactions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM interactions WHERE responded = 0",
            [],
            |row| row.get(0),
        )?;

        let mut drafts_by_status = std::collections::HashMap::new();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM drafts GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((status, count))
        })?;
        for row in rows {
            let (status, count) = row?;
            drafts_by_status.insert(status, count);
        }

        Ok(KnowledgeStats {
            total_documents,
            total_fragments,
            embedded_fragments,
            total_interactions,
            unresponded_interactions,
            drafts_by_status,
        })
    }
}
