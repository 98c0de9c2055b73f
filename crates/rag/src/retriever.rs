//! Document Q&A retriever
//!
//! Turns a question into a single grounded string for the reasoning
//! service. An empty result is a normal answer, not an error.

use std::sync::Arc;

use voice_agent_config::constants::rag;
use voice_agent_config::RagConfig;
use voice_agent_core::SearchIndex;
use voice_agent_text_processing::truncate_graphemes;

use crate::RagError;

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Chunks fetched per question
    pub top_k: usize,
    /// Answer cap in characters (before the ellipsis)
    pub max_answer_chars: usize,
    /// Appended when the answer was cut
    pub ellipsis: String,
    /// Returned when nothing was retrieved
    pub not_found_message: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: rag::TOP_K,
            max_answer_chars: rag::MAX_ANSWER_CHARS,
            ellipsis: rag::ELLIPSIS.to_string(),
            not_found_message: rag::NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

impl From<&RagConfig> for RetrieverConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            top_k: config.top_k,
            max_answer_chars: config.max_answer_chars,
            ellipsis: config.ellipsis.clone(),
            not_found_message: config.not_found_message.clone(),
        }
    }
}

/// Answers questions from an injected search index
pub struct DocumentRetriever {
    index: Arc<dyn SearchIndex>,
    config: RetrieverConfig,
}

impl DocumentRetriever {
    pub fn new(index: Arc<dyn SearchIndex>, config: RetrieverConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Number of chunks behind this retriever
    pub fn indexed_chunks(&self) -> usize {
        self.index.len()
    }

    /// Retrieve, join and cap an answer for `question`
    pub async fn answer(&self, question: &str) -> Result<String, RagError> {
        let chunks = self
            .index
            .query(question, self.config.top_k)
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        tracing::debug!(question, results = chunks.len(), "Retrieved chunks");

        if chunks.is_empty() {
            return Ok(self.config.not_found_message.clone());
        }

        let joined = chunks
            .iter()
            .map(|c| c.content.trim())
            .collect::<Vec<_>>()
            .join("\n");

        let cut = truncate_graphemes(&joined, self.config.max_answer_chars);
        if cut.truncated {
            Ok(format!("{}{}", cut.text, self.config.ellipsis))
        } else {
            Ok(cut.text)
        }
    }
}
