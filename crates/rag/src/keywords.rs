//! Legal citation extraction.
//!
//! The pipeline narrows semantic hits by the statutory references a query
//! names ("Article 21", "section 302"). Extraction sits behind
//! [`KeywordExtractor`] so the grammar can grow without touching the
//! assembler.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Normalized keywords from one query, in order of first occurrence.
///
/// Duplicates are kept. An empty list means "no filtering".
pub type QueryKeywords = Vec<String>;

/// Pulls structured references out of raw query text. Must be pure.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, query: &str) -> QueryKeywords;
}

static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(article|section)\s*(\d+)").expect("citation pattern is valid")
});

/// Matches `Article <n>` and `Section <n>`, any case, any spacing.
///
/// Each match is normalized to `"<term> <digits>"` in lowercase, so
/// `"SECTION  144"` and `"section144"` both become `"section 144"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationExtractor;

impl CitationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl KeywordExtractor for CitationExtractor {
    fn extract(&self, query: &str) -> QueryKeywords {
        CITATION
            .captures_iter(query)
            .filter_map(|caps| {
                let term = caps.get(1)?.as_str().to_lowercase();
                let number = caps.get(2)?.as_str();
                Some(format!("{term} {number}"))
            })
            .collect()
    }
}
