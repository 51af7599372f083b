//! Query embedding through a provider's `/embeddings` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use avocado_core::embedder::Embedder;
use avocado_core::error::EmbeddingError;
use avocado_core::provider::{EmbeddingRequest, Provider};
use tracing::debug;

/// An [`Embedder`] backed by a remote [`Provider`].
pub struct ApiEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ApiEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            inputs: vec![text.to_string()],
        };

        let response = self.provider.embed(request).await?;
        let vector = response
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::EmptyOutput)?;

        debug!(model = %self.model, dims = vector.len(), "Query embedded");
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avocado_core::error::ProviderError;
    use avocado_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    struct VectorProvider {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl Provider for VectorProvider {
        fn name(&self) -> &str {
            "vectors"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("completion".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: self.vectors.clone(),
                model: request.model,
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn returns_first_vector() {
        let provider = Arc::new(VectorProvider { vectors: vec![vec![0.5, 0.5]] });
        let embedder = ApiEmbedder::new(provider, "openai/text-embedding-3-small");
        let v = embedder.embed("Article 21").await.unwrap();
        assert_eq!(v, vec![0.5, 0.5]);
        assert_eq!(embedder.model_name(), "openai/text-embedding-3-small");
    }

    #[tokio::test]
    async fn empty_output_is_an_error() {
        let provider = Arc::new(VectorProvider { vectors: vec![] });
        let embedder = ApiEmbedder::new(provider, "m");
        let err = embedder.embed("x").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyOutput));
    }

    #[tokio::test]
    async fn provider_without_embeddings_surfaces_backend_error() {
        struct Plain;

        #[async_trait]
        impl Provider for Plain {
            fn name(&self) -> &str {
                "plain"
            }

            async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
                Err(ProviderError::NotConfigured("completion".into()))
            }
        }

        let embedder = ApiEmbedder::new(Arc::new(Plain), "m");
        let err = embedder.embed("x").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Backend(_)));
    }
}
