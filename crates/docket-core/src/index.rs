//! Search-index collaborator.
//!
//! The index is a lookup accelerator only. Structured queries never consult
//! it, and services treat every index error as a warning.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

/// Free-form string metadata stored beside an indexed document.
pub type Metadata = BTreeMap<String, String>;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// Smaller is closer; results are ordered ascending.
    pub distance: f64,
}

pub trait SearchIndex {
    /// Insert or replace the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Fails when the backing index cannot be written.
    fn upsert(&self, id: &str, text: &str, metadata: &Metadata) -> Result<()>;

    /// Remove `id`; removing an absent id is not an error.
    ///
    /// # Errors
    ///
    /// Fails when the backing index cannot be written.
    fn delete(&self, id: &str) -> Result<()>;

    /// Up to `k` hits for `text` whose metadata contains every pair in
    /// `filter`, ordered by ascending distance.
    ///
    /// # Errors
    ///
    /// Fails when the backing index cannot be read.
    fn query(&self, text: &str, k: usize, filter: &Metadata) -> Result<Vec<SearchHit>>;

    /// Drop every indexed document.
    ///
    /// # Errors
    ///
    /// Fails when the backing index cannot be written.
    fn clear(&self) -> Result<()>;
}

/// True when every `filter` pair is present in `metadata`.
#[must_use]
pub fn metadata_matches(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, value)| metadata.get(key) == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(metadata_matches(&meta(&[("type", "backlog")]), &Metadata::new()));
    }

    #[test]
    fn every_pair_must_match() {
        let doc = meta(&[("type", "backlog"), ("status", "todo")]);
        assert!(metadata_matches(&doc, &meta(&[("type", "backlog")])));
        assert!(!metadata_matches(
            &doc,
            &meta(&[("type", "backlog"), ("status", "done")])
        ));
        assert!(!metadata_matches(&doc, &meta(&[("assignee", "kim")])));
    }
}
