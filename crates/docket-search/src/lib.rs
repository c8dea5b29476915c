#![forbid(unsafe_code)]
//! docket-search library.
//!
//! A SQLite FTS5 implementation of [`docket_core::index::SearchIndex`].
//! Documents are ranked with BM25 and metadata filters are applied after
//! ranking, so a filtered query still returns the closest `k` matches.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod schema;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use docket_core::index::{Metadata, SearchHit, SearchIndex, metadata_matches};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Quote each word of free text as an FTS5 string and join them with `OR`,
/// so punctuation and query operators in user input are never interpreted.
///
/// Returns `None` when the text has no searchable words.
#[must_use]
pub fn sanitize_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// BM25 rank (negative, lower is better) to a distance in `(0, 1]`.
#[must_use]
pub fn rank_to_distance(rank: f64) -> f64 {
    1.0 / (1.0 + (-rank).max(0.0))
}

pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    /// Open (or create) an index database at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create index directory {}", parent.display()))?;
        }
        let mut conn = Connection::open(path)
            .with_context(|| format!("open search index {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("configure sqlite busy timeout")?;
        let version = schema::migrate(&mut conn).context("apply search index migrations")?;
        debug!(path = %path.display(), version, "opened search index");
        Ok(Self { conn })
    }

    /// # Errors
    ///
    /// Fails when the schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("open in-memory search index")?;
        schema::migrate(&mut conn).context("apply search index migrations")?;
        Ok(Self { conn })
    }

    /// Number of indexed documents.
    ///
    /// # Errors
    ///
    /// Fails when the count query fails.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .context("count indexed documents")?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// # Errors
    ///
    /// Fails when the count query fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Stored text and metadata for `id`.
    ///
    /// # Errors
    ///
    /// Fails when the lookup fails or stored metadata is not valid JSON.
    pub fn get(&self, id: &str) -> Result<Option<(String, Metadata)>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT body, metadata FROM documents WHERE doc_id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .with_context(|| format!("look up indexed document {id}"))?;
        row.map(|(body, raw)| parse_metadata(&raw).map(|metadata| (body, metadata)))
            .transpose()
    }
}

fn parse_metadata(raw: &str) -> Result<Metadata> {
    serde_json::from_str(raw).context("decode stored metadata")
}

impl SearchIndex for SqliteIndex {
    fn upsert(&self, id: &str, text: &str, metadata: &Metadata) -> Result<()> {
        let metadata = serde_json::to_string(metadata).context("encode metadata")?;
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin index upsert")?;
        tx.execute("DELETE FROM documents_fts WHERE doc_id = ?1", params![id])?;
        tx.execute(
            "INSERT INTO documents (doc_id, body, metadata) VALUES (?1, ?2, ?3)
             ON CONFLICT(doc_id) DO UPDATE SET body = excluded.body, metadata = excluded.metadata",
            params![id, text, metadata],
        )?;
        tx.execute(
            "INSERT INTO documents_fts (doc_id, body) VALUES (?1, ?2)",
            params![id, text],
        )?;
        tx.commit()
            .with_context(|| format!("commit index upsert for {id}"))?;
        debug!(id, "indexed document");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin index delete")?;
        tx.execute("DELETE FROM documents_fts WHERE doc_id = ?1", params![id])?;
        tx.execute("DELETE FROM documents WHERE doc_id = ?1", params![id])?;
        tx.commit()
            .with_context(|| format!("commit index delete for {id}"))?;
        Ok(())
    }

    fn query(&self, text: &str, k: usize, filter: &Metadata) -> Result<Vec<SearchHit>> {
        let Some(fts_query) = sanitize_query(text) else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare(
                "SELECT d.doc_id, d.body, d.metadata, bm25(documents_fts) AS rank
                 FROM documents_fts f
                 INNER JOIN documents d ON d.doc_id = f.doc_id
                 WHERE documents_fts MATCH ?1
                 ORDER BY rank",
            )
            .context("prepare BM25 search query")?;
        let rows = stmt
            .query_map(params![fts_query], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })
            .with_context(|| format!("execute search for '{text}'"))?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, document, raw, rank) = row.context("read search hit")?;
            let metadata = parse_metadata(&raw)?;
            if !metadata_matches(&metadata, filter) {
                continue;
            }
            hits.push(SearchHit {
                id,
                document,
                metadata,
                distance: rank_to_distance(rank),
            });
            if hits.len() == k {
                break;
            }
        }
        debug!(query = %text, hits = hits.len(), "search evaluated");
        Ok(hits)
    }

    fn clear(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM documents_fts; DELETE FROM documents;")
            .context("clear search index")?;
        info!("cleared search index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_quotes_words_and_drops_operators() {
        assert_eq!(
            sanitize_query("Login NEAR(bug)* -x").as_deref(),
            Some("\"login\" OR \"near\" OR \"bug\" OR \"x\"")
        );
        assert_eq!(sanitize_query("  ?!  "), None);
    }

    #[test]
    fn distance_is_monotone_in_relevance() {
        assert!((rank_to_distance(0.0) - 1.0).abs() < f64::EPSILON);
        assert!(rank_to_distance(-4.0) < rank_to_distance(-1.0));
        assert!((rank_to_distance(3.0) - 1.0).abs() < f64::EPSILON);
    }
}
