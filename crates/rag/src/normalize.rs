//! Search query normalization.

/// Filler phrases stripped from queries before embedding.
pub const FILLER_PHRASES: &[&str] = &["random", "some", "give me", "about", "related to", "case of"];

/// Lowercases a query and strips filler phrases.
///
/// Phrases are removed as plain substrings, repeatedly, until none remain.
/// If nothing is left the trimmed original query is returned instead, so a
/// non-blank query never normalizes to an empty search string.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    fillers: Vec<String>,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self::new(FILLER_PHRASES.iter().copied())
    }
}

impl QueryNormalizer {
    pub fn new<I, S>(fillers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fillers = fillers
            .into_iter()
            .map(|f| f.into().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        Self { fillers }
    }

    pub fn normalize(&self, query: &str) -> String {
        let mut current = query.to_lowercase();
        loop {
            let stripped = self
                .fillers
                .iter()
                .fold(current.clone(), |acc, filler| acc.replace(filler.as_str(), ""));
            if stripped == current {
                break;
            }
            current = stripped;
        }

        match current.trim() {
            "" => query.trim().to_string(),
            cleaned => cleaned.to_string(),
        }
    }
}
