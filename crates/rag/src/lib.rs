//! Retrieval-augmented grounding for the voice agent
//!
//! Features:
//! - Fixed-window character chunking with overlap
//! - Persisted flat vector index with cosine (or L2) similarity
//! - OpenAI-compatible and hash-based embedders
//! - Document Q&A retriever with grapheme-safe answer truncation
//! - `.txt` corpus loader for offline index builds

pub mod chunker;
pub mod embeddings;
pub mod knowledge_loader;
pub mod retriever;
pub mod similarity;
pub mod vector_store;

pub use chunker::{split, ChunkSplitter};
pub use embeddings::{OpenAiEmbedder, OpenAiEmbeddingConfig, SimpleEmbedder};
pub use knowledge_loader::{IndexBuildStats, KnowledgeLoader};
pub use retriever::{DocumentRetriever, RetrieverConfig};
pub use similarity::{blob_to_vec, cosine_similarity, euclidean_distance, vec_to_blob};
pub use vector_store::{VectorDistance, VectorIndex, INDEX_FILE, INDEX_FORMAT_VERSION, VECTORS_FILE};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid chunking or retrieval parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Persisted index unreadable or incompatible with the embedder
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Wrap a failed embedder call, keeping the provider message
    pub(crate) fn from_embedder(err: voice_agent_core::Error) -> Self {
        match err {
            voice_agent_core::Error::EmbeddingService(msg) => RagError::Embedding(msg),
            other => RagError::Embedding(other.to_string()),
        }
    }
}

impl From<RagError> for voice_agent_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Configuration(msg) => voice_agent_core::Error::Configuration(msg),
            RagError::Embedding(msg) => voice_agent_core::Error::EmbeddingService(msg),
            RagError::CorruptIndex(msg) => voice_agent_core::Error::CorruptIndex(msg),
            RagError::Io(e) => voice_agent_core::Error::Io(e),
            other => voice_agent_core::Error::Rag(other.to_string()),
        }
    }
}
