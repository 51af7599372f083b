//! Select and open a vector index backend from configuration.

use std::sync::Arc;
use std::time::Duration;

use avocado_config::{AppConfig, IndexBackend};
use avocado_core::error::IndexError;
use avocado_core::index::VectorIndex;
use tracing::debug;

use crate::in_memory::InMemoryIndex;
use crate::pinecone::PineconeIndex;

/// Open the backend named by `backend`.
pub async fn build_index(
    config: &AppConfig,
    backend: IndexBackend,
) -> Result<Arc<dyn VectorIndex>, IndexError> {
    let index: Arc<dyn VectorIndex> = match backend {
        IndexBackend::Local => open_local(config).await?,
        IndexBackend::Hosted => Arc::new(PineconeIndex::from_config(
            &config.index.hosted,
            Duration::from_secs(config.completion.timeout_secs),
        )?),
        IndexBackend::Memory => Arc::new(InMemoryIndex::new()),
    };

    debug!(backend = %backend, index = index.name(), "Vector index ready");
    Ok(index)
}

#[cfg(feature = "sqlite")]
async fn open_local(config: &AppConfig) -> Result<Arc<dyn VectorIndex>, IndexError> {
    let local = &config.index.local;
    let index = crate::sqlite::SqliteIndex::open(&local.path, &local.collection).await?;
    Ok(Arc::new(index))
}

#[cfg(not(feature = "sqlite"))]
async fn open_local(_config: &AppConfig) -> Result<Arc<dyn VectorIndex>, IndexError> {
    Err(IndexError::Storage(
        "the local index requires building with the `sqlite` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_starts_empty() {
        let index = build_index(&AppConfig::default(), IndexBackend::Memory).await.unwrap();
        assert_eq!(index.name(), "in_memory");
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn hosted_backend_requires_key() {
        let err = build_index(&AppConfig::default(), IndexBackend::Hosted)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::Storage(_)));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn local_backend_opens_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.index.local.path = dir.path().join("judgments.sqlite");

        let index = build_index(&config, IndexBackend::Local).await.unwrap();
        assert_eq!(index.name(), "sqlite");
        assert!(config.index.local.path.exists());
    }
}
