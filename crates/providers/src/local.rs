//! Local embedding - runs the sentence-embedding model in-process.
//!
//! Uses [fastembed](https://github.com/Anush008/fastembed-rs) (ONNX runtime)
//! with `all-MiniLM-L6-v2`, the model the judgment corpus was embedded with.
//! 384 dimensions, no API key, no network after the first model download.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use avocado_core::embedder::Embedder;
use avocado_core::error::EmbeddingError;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

/// An [`Embedder`] running `all-MiniLM-L6-v2` locally.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbedder {
    /// Load the model, downloading it on first use (~90 MB).
    pub fn new() -> Result<Self, EmbeddingError> {
        let opts = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(true);

        let model = TextEmbedding::try_new(opts)
            .map_err(|e| EmbeddingError::Backend(format!("Failed to load embedding model: {e}")))?;

        info!("Local embedding model loaded: all-MiniLM-L6-v2");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let input = text.to_string();

        // Inference is CPU-bound; keep it off the async workers.
        let vectors = tokio::task::spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|_| EmbeddingError::Backend("embedding model lock poisoned".into()))?;
            guard
                .embed(vec![input], None)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::Backend(format!("embedding task failed: {e}")))??;

        let vector = vectors.into_iter().next().ok_or(EmbeddingError::EmptyOutput)?;
        debug!(dims = vector.len(), "Query embedded locally");
        Ok(vector)
    }
}
