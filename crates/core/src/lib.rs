//! Core traits and types for the voice agent
//!
//! This crate provides foundational types used across all other crates:
//! - Document and chunk types for the retrieval index
//! - Core traits for pluggable backends (embeddings, index search, STT, TTS, LLM)
//! - Chat and tool-calling message types
//! - Error types

pub mod document;
pub mod error;
pub mod llm_types;
pub mod traits;

pub use document::{Chunk, Document, SOURCE_KEY};
pub use error::{Error, Result};
pub use llm_types::{
    FinishReason, GenerateRequest, GenerateResponse, Message, Role, TokenUsage, ToolCall,
    ToolDefinition,
};

pub use traits::{Embedder, LanguageModel, SearchIndex, SpeechToText, TextToSpeech};
