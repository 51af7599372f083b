//! Vector index backends for Avocado.
//!
//! - [`SqliteIndex`] - local persistent store (default `sqlite` feature)
//! - [`PineconeIndex`] - hosted index over the Pinecone REST API
//! - [`InMemoryIndex`] - ephemeral, for tests and dry runs
//!
//! [`ingest`] bulk-loads precomputed embeddings into any of them.

pub mod builder;
pub mod in_memory;
pub mod ingest;
pub mod pinecone;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod vector;

pub use builder::build_index;
pub use in_memory::InMemoryIndex;
pub use ingest::{IngestStats, ingest_file, ingest_reader};
pub use pinecone::PineconeIndex;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIndex;
