//! # Avocado RAG
//!
//! The retrieval-and-context-assembly pipeline behind every answer:
//!
//! - [`QueryNormalizer`] strips filler phrases before embedding
//! - [`KeywordExtractor`] pulls citations ("Article 21") from the raw query
//! - [`ContextAssembler`] filters hits by citation, formats and bounds them
//! - [`HistoryManager`] keeps the last turns and renders the prompt excerpt
//! - [`PromptBuilder`] composes the system + user exchange
//! - [`QueryOrchestrator`] runs one question end to end
//!
//! The embedder, index and completion provider are injected as
//! `avocado_core` trait objects.

pub mod context;
pub mod history;
pub mod instructions;
pub mod keywords;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{AssembledContext, AssemblyReport, ContextAssembler, ContextBudget, FilterOutcome};
pub use history::HistoryManager;
pub use keywords::{CitationExtractor, KeywordExtractor, QueryKeywords};
pub use normalize::QueryNormalizer;
pub use orchestrator::{NO_CONTEXT_REPLY, PipelineSettings, QueryOrchestrator, QueryOutcome, ReplyKind};
pub use prompt::{GenerationParams, PromptBuilder, PromptRequest};
