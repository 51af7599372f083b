//! Context assembly: keyword filtering over semantic hits, block formatting
//! and the character budget.
//!
//! # Steps
//!
//! 1. Nothing retrieved, or every chunk blank: [`AssembledContext::NoContext`].
//! 2. Keywords present: keep chunks whose text + metadata contain *all* of them.
//! 3. Filter removed everything: fall back to the unfiltered hits.
//! 4. Format each survivor as a four-field block, in retrieval order.
//! 5. Join with newlines; past the budget, hard-cut and append
//!    [`TRUNCATION_MARKER`].
//!
//! Assembly is deterministic and never reorders hits.

use avocado_config::RetrievalConfig;
use avocado_core::corpus::{BENCH, CASE_TITLE, Chunk, DATE_OF_JUDGMENT, RetrievalResult, ScoredChunk};
use serde::Serialize;
use tracing::debug;

use crate::keywords::QueryKeywords;

/// Appended after a truncated context.
pub const TRUNCATION_MARKER: &str = "\n\n...[Context truncated]...";

/// Default character budget for the joined blocks.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;

/// Size and filtering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    /// Characters (not bytes) kept before the truncation marker.
    pub max_chars: usize,
    /// Use the unfiltered hits when the keyword filter keeps nothing.
    pub keyword_fallback: bool,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CONTEXT_CHARS,
            keyword_fallback: true,
        }
    }
}

impl From<&RetrievalConfig> for ContextBudget {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            max_chars: config.max_context_chars,
            keyword_fallback: config.keyword_fallback,
        }
    }
}

/// What the keyword filter did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOutcome {
    /// No keywords in the query.
    NotApplied,
    /// At least one chunk matched every keyword.
    Matched,
    /// Nothing matched; the unfiltered hits were used.
    FellBack,
    /// Nothing matched and fallback is disabled.
    Eliminated,
}

/// Bookkeeping for one assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub retrieved: usize,
    pub included: usize,
    pub filter: FilterOutcome,
    pub truncated: bool,
}

/// Result of assembling one query's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembledContext {
    /// Formatted blocks ready for the prompt.
    Grounded { text: String, report: AssemblyReport },
    /// Nothing usable was retrieved; the pipeline short-circuits.
    NoContext,
}

impl AssembledContext {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Grounded { text, .. } => Some(text),
            Self::NoContext => None,
        }
    }

    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded { .. })
    }
}

/// Turns retrieval hits into the bounded context block.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    budget: ContextBudget,
}

impl ContextAssembler {
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> ContextBudget {
        self.budget
    }

    pub fn assemble(
        &self,
        query: &str,
        retrieved: &RetrievalResult,
        keywords: &QueryKeywords,
    ) -> AssembledContext {
        if retrieved.iter().all(|hit| hit.chunk.is_blank()) {
            debug!(query, retrieved = retrieved.len(), "No usable chunks retrieved");
            return AssembledContext::NoContext;
        }

        let (survivors, filter) = self.filter(retrieved, keywords);
        if survivors.is_empty() {
            debug!(query, ?keywords, "Keyword filter eliminated every chunk");
            return AssembledContext::NoContext;
        }

        let joined = survivors
            .iter()
            .map(|hit| format_block(&hit.chunk))
            .collect::<Vec<_>>()
            .join("\n");
        let (text, truncated) = truncate_chars(joined, self.budget.max_chars);

        let report = AssemblyReport {
            retrieved: retrieved.len(),
            included: survivors.len(),
            filter,
            truncated,
        };
        debug!(
            query,
            retrieved = report.retrieved,
            included = report.included,
            filter = ?report.filter,
            truncated,
            "Context assembled"
        );

        AssembledContext::Grounded { text, report }
    }

    /// Conjunctive keyword filter. Preserves input order.
    fn filter<'a>(
        &self,
        retrieved: &'a RetrievalResult,
        keywords: &QueryKeywords,
    ) -> (Vec<&'a ScoredChunk>, FilterOutcome) {
        let all: Vec<&ScoredChunk> = retrieved.iter().collect();
        if keywords.is_empty() {
            return (all, FilterOutcome::NotApplied);
        }

        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let matched: Vec<&ScoredChunk> = retrieved
            .iter()
            .filter(|hit| {
                let haystack = hit.chunk.searchable_text();
                needles.iter().all(|needle| haystack.contains(needle.as_str()))
            })
            .collect();

        if !matched.is_empty() {
            (matched, FilterOutcome::Matched)
        } else if self.budget.keyword_fallback {
            (all, FilterOutcome::FellBack)
        } else {
            (matched, FilterOutcome::Eliminated)
        }
    }
}

/// One delimited block: case title, date, bench, content.
pub fn format_block(chunk: &Chunk) -> String {
    let case_title = chunk.meta(CASE_TITLE).unwrap_or("Unknown Case");
    let date = chunk.meta(DATE_OF_JUDGMENT).unwrap_or("Unknown Date");
    let bench = chunk.meta(BENCH).unwrap_or("N/A");
    format!(
        "---\nCase Title: {case_title}\nDate: {date}\nBench: {bench}\nContent: {}\n---",
        chunk.text
    )
}

/// Keep the first `max_chars` characters, then append the marker.
fn truncate_chars(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            text.truncate(cut);
            text.push_str(TRUNCATION_MARKER);
            (text, true)
        }
        None => (text, false),
    }
}
