//! VectorIndex trait - nearest-neighbour search over precomputed chunks.
//!
//! Two interchangeable backends exist (a local persistent store and a hosted
//! index); the retrieval pipeline only relies on results arriving best-first.

use async_trait::async_trait;

use crate::corpus::{IndexRecord, RetrievalResult};
use crate::error::IndexError;

/// The core VectorIndex trait.
///
/// Implementations: SQLite (local persistent), Pinecone (hosted), in-memory.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The backend name (e.g., "sqlite", "pinecone").
    fn name(&self) -> &str;

    /// Return at most `k` chunks nearest to `vector`, best first.
    ///
    /// An empty store yields an empty result, never an error.
    async fn search(&self, vector: &[f32], k: usize) -> Result<RetrievalResult, IndexError>;

    /// Bulk-load records. Idempotent on `id`. Returns the number written.
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, IndexError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, IndexError>;
}
