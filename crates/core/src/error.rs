//! Error types for the Avocado domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external capability has its own error enum.

use thiserror::Error;

/// The top-level error type for all Avocado operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Embedding errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Vector index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Capability errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding backend failed: {0}")]
    Backend(String),

    #[error("Embedding backend returned no vector")]
    EmptyOutput,

    #[error("Embedder not configured: {0}")]
    NotConfigured(String),
}

impl From<ProviderError> for EmbeddingError {
    fn from(err: ProviderError) -> Self {
        Self::Backend(err.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Index service error: {message} (status: {status_code})")]
    Backend {
        status_code: u16,
        message: String,
    },

    #[error("Index not found: {0}")]
    NotFound(String),

    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
}
