//! # Avocado Core
//!
//! Domain types, capability traits, and error definitions for the Avocado
//! legal research assistant. This crate performs **no I/O** - it defines the
//! model that the retrieval pipeline and every backend implement against.
//!
//! ## Capabilities
//!
//! The pipeline consumes three external capabilities, each a trait here:
//! - [`Embedder`] - free text to a fixed-length vector
//! - [`VectorIndex`] - nearest-neighbour search over precomputed chunks
//! - [`Provider`] - remote text completion
//!
//! Implementations live in `avocado-providers` and `avocado-index`.

pub mod conversation;
pub mod corpus;
pub mod embedder;
pub mod error;
pub mod index;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use conversation::{ConversationHistory, ConversationTurn};
pub use corpus::{Chunk, IndexRecord, RetrievalResult, ScoredChunk};
pub use embedder::Embedder;
pub use error::{EmbeddingError, Error, IndexError, ProviderError, Result};
pub use index::VectorIndex;
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
