//! Subcommand implementations and the wiring they share.

pub mod ask;
pub mod chat;
pub mod ingest;
pub mod onboard;
pub mod status;

use std::path::{Path, PathBuf};

use avocado_config::{AppConfig, IndexBackend, Profile};
use avocado_rag::{PipelineSettings, QueryOrchestrator};
use tracing::debug;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// The config file in use: `--config` or the default location.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load the config file, then apply environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_path(explicit);
    AppConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// The profile's index backend unless overridden on the command line.
pub fn resolve_backend(config: &AppConfig, profile: Profile, index: Option<IndexBackend>) -> IndexBackend {
    index.unwrap_or(config.profile(profile).index)
}

/// Wire completion client, embedder and index into an orchestrator.
pub async fn build_pipeline(
    config: &AppConfig,
    profile: Profile,
    index: Option<IndexBackend>,
) -> Result<QueryOrchestrator, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No completion API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    GITHUB_TOKEN     = 'ghp_...'   (GitHub Models, default endpoint)");
        eprintln!("    AVOCADO_API_KEY  = '...'       (any OpenAI-compatible endpoint)");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let completion = avocado_providers::build_completion(config)?;
    let embedder = avocado_providers::build_embedder(config, completion.clone())?;
    let backend = resolve_backend(config, profile, index);
    let index = avocado_index::build_index(config, backend).await?;

    debug!(%profile, %backend, embedder = embedder.model_name(), "Pipeline ready");
    Ok(QueryOrchestrator::new(
        embedder,
        index,
        completion,
        PipelineSettings::for_profile(config, profile),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_path_wins() {
        let path = config_path(Some(Path::new("/tmp/avocado.toml")));
        assert_eq!(path, PathBuf::from("/tmp/avocado.toml"));
        assert!(config_path(None).ends_with("config.toml"));
    }

    #[test]
    fn index_override_beats_profile() {
        let config = AppConfig::default();
        assert_eq!(resolve_backend(&config, Profile::Large, None), IndexBackend::Local);
        assert_eq!(resolve_backend(&config, Profile::Small, None), IndexBackend::Hosted);
        assert_eq!(
            resolve_backend(&config, Profile::Small, Some(IndexBackend::Memory)),
            IndexBackend::Memory
        );
    }

    #[tokio::test]
    async fn pipeline_requires_api_key() {
        let config = AppConfig::default();
        assert!(build_pipeline(&config, Profile::Large, Some(IndexBackend::Memory)).await.is_err());
    }

    #[tokio::test]
    async fn pipeline_builds_with_memory_index() {
        let mut config = AppConfig::default();
        config.api_key = Some("ghp_test".into());
        let pipeline = build_pipeline(&config, Profile::Small, Some(IndexBackend::Memory))
            .await
            .unwrap();
        assert_eq!(pipeline.index_name(), "in_memory");
    }
}
