//! Fragment storage and similarity search.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use murmur_core::{ChunkStrategy, Fragment, SourceType};
use rusqlite::params;
use tracing::debug;

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredFragment {
    /// The matching fragment.
    pub fragment: Fragment,
    /// Cosine similarity score.
    pub similarity: f32,
}

/// Calculate cosine similarity between two vectors.
///
/// Zero vectors (and mismatched lengths) score 0.0 rather than erroring:
/// cosine is undefined there and such fragments should simply never rank.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot_product += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

/// Serialize a vector to little-endian bytes.
fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize a vector from little-endian bytes.
fn decode_vector(bytes: &[u8], dimensions: i32) -> Vec<f32> {
    bytes
        .chunks(4)
        .take(dimensions as usize)
        .map(|chunk| {
            if chunk.len() == 4 {
                f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
            } else {
                0.0
            }
        })
        .collect()
}

fn fragment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fragment> {
    let source_type_str: String = row.get(2)?;
    let strategy_str: String = row.get(4)?;
    let vector_bytes: Option<Vec<u8>> = row.get(6)?;
    let dimensions: Option<i32> = row.get(7)?;
    let metadata_str: String = row.get(8)?;
    let created_at_str: String = row.get(9)?;

    Ok(Fragment {
        id: row.get(0)?,
        source_id: row.get(1)?,
        source_type: SourceType::from_str(&source_type_str).unwrap_or(SourceType::Notion),
        ordinal: row.get(3)?,
        strategy: ChunkStrategy::from_str(&strategy_str).unwrap_or_default(),
        content: row.get(5)?,
        vector: vector_bytes.map(|bytes| decode_vector(&bytes, dimensions.unwrap_or(0))),
        metadata: serde_json::from_str(&metadata_str).unwrap_or_default(),
        created_at: super::parse_timestamp(&created_at_str),
    })
}

const FRAGMENT_COLUMNS: &str = "id, source_id, source_type, ordinal, strategy, content, \
                                vector, dimensions, metadata, created_at";

impl Database {
    /// Atomically replace all fragments for a `(source_id, source_type)`
    /// pair: the prior set is deleted and the new one inserted in a single
    /// transaction, so a reader never observes a mixed state. Rolls back
    /// on any failure, leaving the prior set intact.
    pub fn replace_fragments(
        &self,
        source_id: &str,
        source_type: SourceType,
        fragments: &[Fragment],
    ) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            "DELETE FROM fragments WHERE source_id = ?1 AND source_type = ?2",
            params![source_id, source_type.as_str()],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO fragments
                    (id, source_id, source_type, ordinal, strategy, content,
                     vector, dimensions, metadata, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )?;

            for fragment in fragments {
                stmt.execute(params![
                    fragment.id,
                    fragment.source_id,
                    fragment.source_type.as_str(),
                    fragment.ordinal,
                    fragment.strategy.as_str(),
                    fragment.content,
                    fragment.vector.as_deref().map(encode_vector),
                    fragment.vector.as_ref().map(|v| v.len() as i32),
                    fragment.metadata.to_string(),
                    fragment.created_at.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;

        debug!(
            "Replaced {} fragments with {} for {}/{}",
            deleted,
            fragments.len(),
            source_type,
            source_id
        );

        Ok(fragments.len())
    }

    /// Get all fragments for a document, in ordinal order.
    pub fn get_fragments(&self, source_id: &str, source_type: SourceType) -> DbResult<Vec<Fragment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FRAGMENT_COLUMNS} FROM fragments
             WHERE source_id = ?1 AND source_type = ?2 ORDER BY ordinal"
        ))?;

        let fragments = stmt.query_map(params![source_id, source_type.as_str()], fragment_from_row)?;
        fragments.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Count fragments for a document.
    pub fn fragment_count(&self, source_id: &str, source_type: SourceType) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM fragments WHERE source_id = ?1 AND source_type = ?2",
            params![source_id, source_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Find the fragments most similar to a query vector.
    ///
    /// Brute-force scan over all stored vectors, which is fine for the
    /// expected volume (low thousands). Results are sorted by descending
    /// similarity; ties go to the lower ordinal, then insertion order.
    /// An empty store yields an empty result, not an error.
    pub fn similar_fragments(
        &self,
        query_vector: &[f32],
        top_k: usize,
        source_type: Option<SourceType>,
    ) -> DbResult<Vec<ScoredFragment>> {
        let conn = self.conn()?;

        let sql = match source_type {
            Some(_) => format!(
                "SELECT {FRAGMENT_COLUMNS} FROM fragments
                 WHERE vector IS NOT NULL AND source_type = ?1 ORDER BY rowid"
            ),
            None => format!(
                "SELECT {FRAGMENT_COLUMNS} FROM fragments
                 WHERE vector IS NOT NULL ORDER BY rowid"
            ),
        };

        let mut stmt = conn.prepare(&sql)?;

        let rows = match source_type {
            Some(st) => stmt.query_map(params![st.as_str()], fragment_from_row)?,
            None => stmt.query_map([], fragment_from_row)?,
        };

        let mut results: Vec<ScoredFragment> = Vec::new();
        for row in rows {
            let fragment = row?;
            let similarity = fragment
                .vector
                .as_deref()
                .map(|v| cosine_similarity(query_vector, v))
                .unwrap_or(0.0);
            results.push(ScoredFragment {
                fragment,
                similarity,
            });
        }

        // Stable sort preserves insertion (rowid) order for full ties.
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.fragment.ordinal.cmp(&b.fragment.ordinal))
        });
        results.truncate(top_k);

        Ok(results)
    }

    /// Get fragment counts: (embedded, total).
    pub fn embedding_stats(&self) -> DbResult<(i64, i64)> {
        let conn = self.conn()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM fragments", [], |row| row.get(0))?;
        let embedded: i64 = conn.query_row(
            "SELECT COUNT(*) FROM fragments WHERE vector IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        Ok((embedded, total))
    }
}
