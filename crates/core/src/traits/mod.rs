//! Core traits for the voice agent system
//!
//! Backends for the external collaborators are expressed as traits so
//! the pipeline, retrieval and dialogue code can run against fakes in tests.
//!
//! # Trait Hierarchy
//!
//! ```text
//! Speech Processing:
//!   - SpeechToText: Audio → Text transcription
//!   - TextToSpeech: Text → Audio synthesis
//!
//! Language Models:
//!   - LanguageModel: Chat generation and tool calling
//!
//! Retrieval:
//!   - Embedder: Text → fixed-dimension vector
//!   - SearchIndex: Similarity query over embedded chunks
//! ```

mod llm;
mod retrieval;
mod speech;

pub use llm::LanguageModel;
pub use retrieval::{Embedder, SearchIndex};
pub use speech::{SpeechToText, TextToSpeech};
