//! Configuration loading, validation, and management for Avocado.
//!
//! Loads configuration from `~/.avocado/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The root configuration structure.
///
/// Maps directly to `~/.avocado/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion API key (GitHub token for the GitHub Models endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion endpoint and generation parameters
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Query embedding backend
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Context assembly and history windowing
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Vector index backends
    #[serde(default)]
    pub index: IndexConfig,

    /// Per-corpus presets
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("completion", &self.completion)
            .field("embedding", &self.embedding)
            .field("retrieval", &self.retrieval)
            .field("index", &self.index)
            .field("profiles", &self.profiles)
            .finish()
    }
}

// ── Completion ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_completion_url() -> String {
    "https://models.github.ai/inference".into()
}
fn default_model() -> String {
    "mistral-ai/Mistral-Nemo".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_top_p() -> f32 {
    1.0
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────────────────

/// Where query embeddings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint
    Api,
    /// In-process model (requires the `local` build feature)
    Local,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Defaults to the completion base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Defaults to the completion API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Api
}
fn default_embedding_model() -> String {
    "openai/text-embedding-3-small".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            base_url: None,
            api_key: None,
        }
    }
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

// ── Retrieval ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Character budget of the assembled context
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Fall back to the unfiltered hits when the keyword filter keeps nothing
    #[serde(default = "default_true")]
    pub keyword_fallback: bool,

    #[serde(default = "default_history_max_turns")]
    pub history_max_turns: usize,

    #[serde(default = "default_history_excerpt_turns")]
    pub history_excerpt_turns: usize,
}

fn default_max_context_chars() -> usize {
    12_000
}
fn default_true() -> bool {
    true
}
fn default_history_max_turns() -> usize {
    20
}
fn default_history_excerpt_turns() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            keyword_fallback: true,
            history_max_turns: default_history_max_turns(),
            history_excerpt_turns: default_history_excerpt_turns(),
        }
    }
}

// ── Index ─────────────────────────────────────────────────────────────────

/// Which vector index serves a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    /// Local persistent SQLite store
    Local,
    /// Hosted Pinecone index
    Hosted,
    /// Ephemeral in-process store (dry runs)
    Memory,
}

impl FromStr for IndexBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "sqlite" => Ok(Self::Local),
            "hosted" | "pinecone" => Ok(Self::Hosted),
            "memory" | "in_memory" => Ok(Self::Memory),
            other => Err(ConfigError::ValidationError(format!(
                "unknown index backend '{other}' (expected local, hosted or memory)"
            ))),
        }
    }
}

impl fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Hosted => "hosted",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub local: LocalIndexConfig,

    #[serde(default)]
    pub hosted: HostedIndexConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalIndexConfig {
    /// SQLite database file
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_index_path() -> PathBuf {
    AppConfig::config_dir().join("legal_judgments.sqlite")
}
fn default_collection() -> String {
    "legal_judgments".into()
}

impl Default for LocalIndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            collection: default_collection(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct HostedIndexConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Data-plane host; resolved through the control plane when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn default_index_name() -> String {
    "legal-landmark-cases".into()
}

impl Default for HostedIndexConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: default_index_name(),
            host: None,
            namespace: None,
        }
    }
}

impl fmt::Debug for HostedIndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedIndexConfig")
            .field("api_key", &redact(&self.api_key))
            .field("index_name", &self.index_name)
            .field("host", &self.host)
            .field("namespace", &self.namespace)
            .finish()
    }
}

// ── Profiles ──────────────────────────────────────────────────────────────

/// A corpus preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Full judgment corpus in the local store
    Large,
    /// Landmark cases in the hosted index
    Small,
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "large" => Ok(Self::Large),
            "small" => Ok(Self::Small),
            other => Err(ConfigError::ValidationError(format!(
                "unknown profile '{other}' (expected large or small)"
            ))),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Large => "large",
            Self::Small => "small",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileConfig {
    pub index: IndexBackend,

    /// Nearest neighbours fetched per query
    pub top_k: usize,

    pub temperature: f32,

    /// Replaces the built-in system instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Both presets. A `[profiles.*]` section only overrides the keys it names;
/// everything else keeps that preset's default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawProfiles")]
pub struct ProfilesConfig {
    pub large: ProfileConfig,
    pub small: ProfileConfig,
}

#[derive(Deserialize)]
struct RawProfiles {
    #[serde(default)]
    large: ProfileOverrides,

    #[serde(default)]
    small: ProfileOverrides,
}

#[derive(Default, Deserialize)]
struct ProfileOverrides {
    index: Option<IndexBackend>,
    top_k: Option<usize>,
    temperature: Option<f32>,
    system_prompt: Option<String>,
}

impl ProfileOverrides {
    fn over(self, preset: ProfileConfig) -> ProfileConfig {
        ProfileConfig {
            index: self.index.unwrap_or(preset.index),
            top_k: self.top_k.unwrap_or(preset.top_k),
            temperature: self.temperature.unwrap_or(preset.temperature),
            system_prompt: self.system_prompt.or(preset.system_prompt),
        }
    }
}

impl From<RawProfiles> for ProfilesConfig {
    fn from(raw: RawProfiles) -> Self {
        Self {
            large: raw.large.over(ProfileConfig::large()),
            small: raw.small.over(ProfileConfig::small()),
        }
    }
}

impl ProfileConfig {
    fn large() -> Self {
        Self {
            index: IndexBackend::Local,
            top_k: 15,
            temperature: 0.3,
            system_prompt: None,
        }
    }

    fn small() -> Self {
        Self {
            index: IndexBackend::Hosted,
            top_k: 5,
            temperature: 0.2,
            system_prompt: None,
        }
    }
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            large: ProfileConfig::large(),
            small: ProfileConfig::small(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.avocado/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `AVOCADO_API_KEY`, then `GITHUB_TOKEN` - completion key
    /// - `AVOCADO_MODEL` - completion model
    /// - `PINECONE_API_KEY`, `PINECONE_INDEX`, `PINECONE_HOST` - hosted index
    /// - `AVOCADO_INDEX_PATH` - local store file
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("AVOCADO_API_KEY").or_else(|| lookup("GITHUB_TOKEN")) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("AVOCADO_MODEL") {
            self.completion.model = model;
        }
        if let Some(key) = lookup("PINECONE_API_KEY") {
            self.index.hosted.api_key = Some(key);
        }
        if let Some(name) = lookup("PINECONE_INDEX") {
            self.index.hosted.index_name = name;
        }
        if let Some(host) = lookup("PINECONE_HOST") {
            self.index.hosted.host = Some(host);
        }
        if let Some(path) = lookup("AVOCADO_INDEX_PATH") {
            self.index.local.path = PathBuf::from(path);
        }
    }

    /// Settings for one corpus profile.
    pub fn profile(&self, profile: Profile) -> &ProfileConfig {
        match profile {
            Profile::Large => &self.profiles.large,
            Profile::Small => &self.profiles.small,
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".avocado")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, profile) in [("large", &self.profiles.large), ("small", &self.profiles.small)] {
            if !(0.0..=2.0).contains(&profile.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "profiles.{name}.temperature must be between 0.0 and 2.0"
                )));
            }
            if profile.top_k == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "profiles.{name}.top_k must be at least 1"
                )));
            }
        }

        if !(self.completion.top_p > 0.0 && self.completion.top_p <= 1.0) {
            return Err(ConfigError::ValidationError(
                "completion.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.retrieval.max_context_chars == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_context_chars must be at least 1".into(),
            ));
        }

        if self.retrieval.history_max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.history_max_turns must be at least 1".into(),
            ));
        }

        if self.retrieval.history_excerpt_turns > self.retrieval.history_max_turns {
            return Err(ConfigError::ValidationError(
                "retrieval.history_excerpt_turns cannot exceed history_max_turns".into(),
            ));
        }

        Ok(())
    }

    /// Check if a completion API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion: CompletionConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            index: IndexConfig::default(),
            profiles: ProfilesConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
