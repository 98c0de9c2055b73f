//! LLM Integration
//!
//! Features:
//! - OpenAI-compatible chat completions (OpenAI, vLLM, local servers)
//! - Native tool calling with `tool_choice: "auto"`
//! - Token usage reporting

pub mod backend;

pub use backend::{OpenAIBackend, OpenAIConfig};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for voice_agent_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => voice_agent_core::Error::Configuration(msg),
            other => voice_agent_core::Error::Llm(other.to_string()),
        }
    }
}
