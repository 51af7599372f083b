//! Scripted capabilities for pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use avocado_core::corpus::{Chunk, IndexRecord, RetrievalResult, ScoredChunk};
use avocado_core::embedder::Embedder;
use avocado_core::error::{EmbeddingError, IndexError, ProviderError};
use avocado_core::index::VectorIndex;
use avocado_core::message::Message;
use avocado_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// Returns queued replies in order and records every request.
///
/// Panics if called more times than it has replies.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider exhausted after {} calls", self.call_count()));

        reply.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// Embeds every text to the same vector and records the inputs.
pub struct FixedEmbedder {
    result: Result<Vec<f32>, EmbeddingError>,
    inputs: Mutex<Vec<String>>,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            result: Ok(vector),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: EmbeddingError) -> Self {
        Self {
            result: Err(error),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    fn model_name(&self) -> &str {
        "fixed"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.inputs.lock().unwrap().push(text.to_string());
        self.result.clone()
    }
}

/// Returns a fixed hit list (truncated to `k`) and records each `k`.
pub struct StaticIndex {
    result: Result<RetrievalResult, IndexError>,
    requested_k: Mutex<Vec<usize>>,
}

impl StaticIndex {
    pub fn new(hits: RetrievalResult) -> Self {
        Self {
            result: Ok(hits),
            requested_k: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn failing(error: IndexError) -> Self {
        Self {
            result: Err(error),
            requested_k: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_k(&self) -> Vec<usize> {
        self.requested_k.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for StaticIndex {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _vector: &[f32], k: usize) -> Result<RetrievalResult, IndexError> {
        self.requested_k.lock().unwrap().push(k);
        self.result.clone().map(|mut hits| {
            hits.truncate(k);
            hits
        })
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, IndexError> {
        Ok(records.len())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.result.as_ref().map(Vec::len).unwrap_or(0))
    }
}

/// A hit with full judgment metadata.
pub fn judgment(id: &str, text: &str, case_title: &str) -> ScoredChunk {
    ScoredChunk::new(
        Chunk::new(id, text)
            .with_meta("case_title", case_title)
            .with_meta("date_of_judgment", "1978-01-25")
            .with_meta("bench", "M.H. Beg"),
        0.8,
    )
}
