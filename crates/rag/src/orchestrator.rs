//! One request/response cycle of the retrieval pipeline.
//!
//! # Flow
//!
//! 1. Normalize the raw query (filler phrases stripped) for search
//! 2. Extract citation keywords from the *raw* query
//! 3. Embed the normalized query and fetch the top-k hits
//! 4. Assemble the bounded context block
//! 5. No context: reply with a fixed apology, skip the completion call
//! 6. Otherwise build the prompt and call the completion provider
//! 7. Append `(raw query, reply)` to history and return both
//!
//! `run` never fails. Upstream errors become the reply text.

use std::sync::Arc;

use avocado_config::{AppConfig, Profile};
use avocado_core::conversation::{ConversationHistory, ConversationTurn};
use avocado_core::embedder::Embedder;
use avocado_core::error::Error;
use avocado_core::index::VectorIndex;
use avocado_core::provider::Provider;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::{AssembledContext, ContextAssembler, ContextBudget};
use crate::history::HistoryManager;
use crate::keywords::{CitationExtractor, KeywordExtractor};
use crate::normalize::QueryNormalizer;
use crate::prompt::PromptBuilder;

/// Reply used when retrieval produced no usable context.
pub const NO_CONTEXT_REPLY: &str =
    "Sorry, I couldn't find relevant information in the legal database for your question.";

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Generated by the completion model from retrieved context.
    Answer,
    /// The fixed apology; no completion call was made.
    NoContext,
    /// An upstream call failed; the reply is the error message.
    Failed,
}

/// Reply plus the updated history.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub reply: String,
    pub history: ConversationHistory,
    pub kind: ReplyKind,
}

/// Per-profile tunables.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub budget: ContextBudget,
    pub history: HistoryManager,
    pub prompt: PromptBuilder,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: 15,
            budget: ContextBudget::default(),
            history: HistoryManager::default(),
            prompt: PromptBuilder::default(),
        }
    }
}

impl PipelineSettings {
    pub fn for_profile(config: &AppConfig, profile: Profile) -> Self {
        Self {
            top_k: config.profile(profile).top_k,
            budget: ContextBudget::from(&config.retrieval),
            history: HistoryManager::from(&config.retrieval),
            prompt: PromptBuilder::for_profile(config, profile),
        }
    }
}

/// Coordinates normalization, retrieval, assembly and completion.
///
/// Holds no per-session state; one instance can serve concurrent sessions.
pub struct QueryOrchestrator {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    completion: Arc<dyn Provider>,
    normalizer: QueryNormalizer,
    keywords: Box<dyn KeywordExtractor>,
    assembler: ContextAssembler,
    history: HistoryManager,
    prompt: PromptBuilder,
    top_k: usize,
}

impl QueryOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        completion: Arc<dyn Provider>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            completion,
            normalizer: QueryNormalizer::default(),
            keywords: Box::new(CitationExtractor::new()),
            assembler: ContextAssembler::new(settings.budget),
            history: settings.history,
            prompt: settings.prompt,
            top_k: settings.top_k,
        }
    }

    /// Replace the citation grammar.
    pub fn with_keyword_extractor(mut self, extractor: impl KeywordExtractor + 'static) -> Self {
        self.keywords = Box::new(extractor);
        self
    }

    pub fn with_normalizer(mut self, normalizer: QueryNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn index_name(&self) -> &str {
        self.index.name()
    }

    /// Answer one question. Always returns a reply and a valid history.
    pub async fn run(&self, raw_query: &str, history: ConversationHistory) -> QueryOutcome {
        let (reply, kind) = match self.answer(raw_query, &history).await {
            Ok(answered) => answered,
            Err(e) => {
                warn!(error = %e, "Query failed");
                (error_reply(&e), ReplyKind::Failed)
            }
        };

        let history = self
            .history
            .append(history, ConversationTurn::new(raw_query, reply.as_str()));
        info!(kind = ?kind, turns = history.len(), "Query complete");

        QueryOutcome { reply, history, kind }
    }

    async fn answer(
        &self,
        raw_query: &str,
        history: &ConversationHistory,
    ) -> Result<(String, ReplyKind), Error> {
        if raw_query.trim().is_empty() {
            debug!("Blank query, nothing to search");
            return Ok((NO_CONTEXT_REPLY.to_string(), ReplyKind::NoContext));
        }

        let search_query = self.normalizer.normalize(raw_query);
        let keywords = self.keywords.extract(raw_query);
        debug!(search_query = %search_query, ?keywords, "Query normalized");

        let vector = self.embedder.embed(&search_query).await?;
        let hits = self.index.search(&vector, self.top_k).await?;
        debug!(index = self.index.name(), hits = hits.len(), k = self.top_k, "Retrieved chunks");

        let context = match self.assembler.assemble(&search_query, &hits, &keywords) {
            AssembledContext::NoContext => {
                info!("No relevant context, skipping completion");
                return Ok((NO_CONTEXT_REPLY.to_string(), ReplyKind::NoContext));
            }
            AssembledContext::Grounded { text, .. } => text,
        };

        let prompt = self
            .prompt
            .build(&context, &self.history.excerpt(history), raw_query);
        let request = self.prompt.to_provider_request(&prompt);
        let response = self.completion.complete(request).await?;

        Ok((response.message.content, ReplyKind::Answer))
    }
}

/// User-facing text for a failed stage.
fn error_reply(err: &Error) -> String {
    match err {
        Error::Embedding(e) => format!("❌ Embedding error: {e}"),
        Error::Index(e) => format!("❌ Index error: {e}"),
        Error::Provider(e) => format!("❌ Completion API error: {e}"),
        other => format!("❌ Pipeline error: {other}"),
    }
}
