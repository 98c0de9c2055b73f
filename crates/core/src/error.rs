//! Core error type
//!
//! Each crate keeps its own error enum and converts into [`Error`] at the
//! trait boundaries defined in [`crate::traits`].

use thiserror::Error;

/// Errors crossing crate boundaries
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameters, rejected before any work starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Embedding provider failure
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// Persisted index is unreadable or does not match the embedder
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Retrieval error: {0}")]
    Rag(String),

    /// Speech-to-text provider failure
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Speech synthesis provider failure
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias using the core [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
