//! Corpus value objects: judgment chunks as stored in and returned by a
//! vector index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the case title.
pub const CASE_TITLE: &str = "case_title";
/// Metadata key holding the judgment date.
pub const DATE_OF_JUDGMENT: &str = "date_of_judgment";
/// Metadata key holding the bench composition.
pub const BENCH: &str = "bench";

/// A segment of a legal judgment with its metadata.
///
/// Immutable once retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier assigned at ingestion.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// String metadata (`case_title`, `date_of_judgment`, `bench`, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// True when the text carries no content.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Text and every metadata value joined by spaces, lowercased.
    pub fn searchable_text(&self) -> String {
        std::iter::once(self.text.as_str())
            .chain(self.metadata.values().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// A chunk paired with the similarity score the index assigned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }
}

/// Ordered nearest-neighbour hits, best first.
///
/// Order is significant and is never reshuffled downstream.
pub type RetrievalResult = Vec<ScoredChunk>;

/// One record handed to [`crate::VectorIndex::upsert`] by the ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searchable_text_covers_metadata() {
        let chunk = Chunk::new("c1", "The right to life")
            .with_meta(CASE_TITLE, "Maneka Gandhi v. Union of India")
            .with_meta(BENCH, "M.H. Beg");
        let text = chunk.searchable_text();
        assert!(text.contains("the right to life"));
        assert!(text.contains("maneka gandhi"));
        assert!(text.contains("m.h. beg"));
    }

    #[test]
    fn whitespace_only_chunk_is_blank() {
        assert!(Chunk::new("c1", "  \n\t ").is_blank());
        assert!(!Chunk::new("c2", " x ").is_blank());
    }

    #[test]
    fn record_metadata_defaults_empty() {
        let rec: IndexRecord =
            serde_json::from_str(r#"{"id":"a","embedding":[0.1],"document":"d"}"#).unwrap();
        assert!(rec.metadata.is_empty());
    }
}
