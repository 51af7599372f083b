//! In-memory index - useful for testing and dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use avocado_core::corpus::{Chunk, IndexRecord, RetrievalResult};
use avocado_core::error::IndexError;
use avocado_core::index::VectorIndex;
use tokio::sync::RwLock;

use crate::vector;

struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// An in-memory vector index ranked by cosine similarity.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    entries: Arc<RwLock<Vec<StoredChunk>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult, IndexError> {
        let entries = self.entries.read().await;
        vector::rank_by_similarity(
            entries.iter().map(|e| (&e.chunk, e.embedding.as_slice())),
            query,
            k,
        )
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, IndexError> {
        if let Some(bad) = records.iter().find(|r| r.embedding.is_empty()) {
            return Err(IndexError::InvalidRecord {
                id: bad.id.clone(),
                reason: "embedding is empty".into(),
            });
        }

        let mut entries = self.entries.write().await;
        let written = records.len();

        for record in records {
            let stored = StoredChunk {
                chunk: Chunk {
                    id: record.id,
                    text: record.document,
                    metadata: record.metadata,
                },
                embedding: record.embedding,
            };
            match entries.iter_mut().find(|e| e.chunk.id == stored.chunk.id) {
                Some(existing) => *existing = stored,
                None => entries.push(stored),
            }
        }

        Ok(written)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.entries.read().await.len())
    }
}
