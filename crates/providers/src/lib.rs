//! Completion and embedding providers for Avocado.
//!
//! The completion client implements `avocado_core::Provider`; embedders
//! implement `avocado_core::Embedder`. The builder selects both from
//! configuration.

pub mod builder;
pub mod embedder;
#[cfg(feature = "local")]
pub mod local;
pub mod openai_compat;

pub use builder::{build_completion, build_embedder};
pub use embedder::ApiEmbedder;
#[cfg(feature = "local")]
pub use local::LocalEmbedder;
pub use openai_compat::OpenAiCompatProvider;
