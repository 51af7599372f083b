//! Vector similarity utilities shared by the local backends.

use std::cmp::Ordering;

use avocado_core::corpus::{Chunk, RetrievalResult, ScoredChunk};
use avocado_core::error::IndexError;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank chunks by cosine similarity to `query`, best first, keeping at most `k`.
///
/// The sort is stable: equal scores keep their input order. A stored
/// embedding whose length differs from the query fails the whole search.
pub fn rank_by_similarity<'a, I>(
    candidates: I,
    query: &[f32],
    k: usize,
) -> Result<RetrievalResult, IndexError>
where
    I: IntoIterator<Item = (&'a Chunk, &'a [f32])>,
{
    let mut scored = Vec::new();
    for (chunk, embedding) in candidates {
        if embedding.len() != query.len() {
            return Err(IndexError::QueryFailed(format!(
                "query has {} dims, index has {} (chunk {})",
                query.len(),
                embedding.len(),
                chunk.id
            )));
        }
        scored.push(ScoredChunk::new(chunk.clone(), cosine_similarity(embedding, query)));
    }

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    Ok(scored)
}

/// Serialize an embedding vector to little-endian bytes.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Inverse of [`embedding_to_blob`]. Trailing partial words are ignored.
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
