//! Build the completion provider and query embedder from configuration.

use std::sync::Arc;
use std::time::Duration;

use avocado_config::{AppConfig, EmbeddingBackend};
use avocado_core::embedder::Embedder;
use avocado_core::error::{EmbeddingError, ProviderError};
use avocado_core::provider::Provider;
use tracing::debug;

use crate::embedder::ApiEmbedder;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the completion provider described by `[completion]`.
pub fn build_completion(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("no completion API key (set GITHUB_TOKEN)".into()))?;

    let provider = OpenAiCompatProvider::new(
        provider_name(&config.completion.base_url),
        &config.completion.base_url,
        api_key,
        Duration::from_secs(config.completion.timeout_secs),
    )?;

    debug!(provider = %provider_name(&config.completion.base_url), "Completion provider ready");
    Ok(Arc::new(provider))
}

/// Build the query embedder described by `[embedding]`.
///
/// The API backend reuses `completion` unless a dedicated endpoint or key is
/// configured.
pub fn build_embedder(
    config: &AppConfig,
    completion: Arc<dyn Provider>,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.embedding.backend {
        EmbeddingBackend::Api => {
            let embedding = &config.embedding;
            let provider = if embedding.base_url.is_none() && embedding.api_key.is_none() {
                completion
            } else {
                let base_url = embedding
                    .base_url
                    .clone()
                    .unwrap_or_else(|| config.completion.base_url.clone());
                let api_key = embedding
                    .api_key
                    .clone()
                    .or_else(|| config.api_key.clone())
                    .unwrap_or_default();
                let provider = OpenAiCompatProvider::new(
                    "embeddings",
                    base_url,
                    api_key,
                    Duration::from_secs(config.completion.timeout_secs),
                )?;
                Arc::new(provider) as Arc<dyn Provider>
            };
            Ok(Arc::new(ApiEmbedder::new(provider, &embedding.model)))
        }
        EmbeddingBackend::Local => build_local_embedder(),
    }
}

#[cfg(feature = "local")]
fn build_local_embedder() -> Result<Arc<dyn Embedder>, EmbeddingError> {
    Ok(Arc::new(crate::local::LocalEmbedder::new()?))
}

#[cfg(not(feature = "local"))]
fn build_local_embedder() -> Result<Arc<dyn Embedder>, EmbeddingError> {
    Err(EmbeddingError::NotConfigured(
        "embedding.backend = \"local\" requires building with the `local` feature".into(),
    ))
}

/// Short provider label derived from the endpoint host.
fn provider_name(base_url: &str) -> &'static str {
    if base_url.contains("models.github.ai") {
        "github-models"
    } else if base_url.contains("openai.com") {
        "openai"
    } else if base_url.contains("localhost") || base_url.contains("127.0.0.1") {
        "local-endpoint"
    } else {
        "openai-compatible"
    }
}
