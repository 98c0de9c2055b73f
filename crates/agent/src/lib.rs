//! Museum guide dialogue session
//!
//! Features:
//! - Welcome utterance followed by the first model reply
//! - Tool-calling turn loop over a [`voice_agent_tools::ToolExecutor`]
//! - Usage metrics pushed over a channel and summarized at teardown
//! - Session events broadcast to observers

pub mod metrics;
pub mod session;

pub use metrics::{MetricsEvent, UsageCollector, UsageSummary};
pub use session::{DialogueSession, SessionConfig, SessionEvent, StartOutcome};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Session already ended")]
    SessionEnded,
}

impl From<voice_agent_core::Error> for AgentError {
    fn from(err: voice_agent_core::Error) -> Self {
        match err {
            voice_agent_core::Error::Tool(msg) => AgentError::Tool(msg),
            other => AgentError::Llm(other.to_string()),
        }
    }
}

impl From<voice_agent_tools::ToolError> for AgentError {
    fn from(err: voice_agent_tools::ToolError) -> Self {
        AgentError::Tool(err.to_string())
    }
}

impl From<AgentError> for voice_agent_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Tool(msg) => voice_agent_core::Error::Tool(msg),
            other => voice_agent_core::Error::Llm(other.to_string()),
        }
    }
}
