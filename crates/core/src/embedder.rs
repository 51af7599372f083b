//! Embedder trait - free text to a fixed-length vector.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Turns text into an embedding.
///
/// Must be deterministic for identical input within a process.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier (e.g., "all-MiniLM-L6-v2").
    fn model_name(&self) -> &str;

    /// Embed a single query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
