//! Speech relay pipeline
//!
//! Turns one recorded utterance into a spoken reply and hands both to a
//! downstream server:
//!
//! ```text
//! audio ─► SpeechToText ─► VerseSegmenter ─► AudioAssembler ─► ForwardingClient
//! ```
//!
//! Stages run strictly in sequence. Provider failures before forwarding
//! abort the remaining stages; forwarding failures are returned as data.

pub mod assembler;
pub mod forwarding;
pub mod relay;
pub mod stt;
pub mod tts;
pub mod verse;

pub use assembler::AudioAssembler;
pub use forwarding::{ForwardResult, ForwardingClient, ForwardingConfig};
pub use relay::{RelayOutcome, RelayStatus, SpeechRelay};
pub use stt::{HttpSttClient, HttpSttConfig};
pub use tts::{HttpTtsClient, HttpTtsConfig};
pub use verse::{split_into_verses, Verse, VerseSegmenter, DEFAULT_TERMINALS};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Any verse failed to synthesize; no partial audio is produced
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<PipelineError> for voice_agent_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Transcription(msg) => voice_agent_core::Error::Transcription(msg),
            PipelineError::Synthesis(msg) => voice_agent_core::Error::Synthesis(msg),
            PipelineError::Configuration(msg) => voice_agent_core::Error::Configuration(msg),
        }
    }
}

/// Metric names recorded by the relay
pub mod metric_names {
    pub const STAGE_SECONDS: &str = "voice_agent_webhook_stage_seconds";
    pub const FORWARD_FAILURES: &str = "voice_agent_forward_failures_total";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_error_keeps_its_core_kind() {
        let cases: [(PipelineError, fn(&voice_agent_core::Error) -> bool); 3] = [
            (PipelineError::Transcription("stt".into()), |e| {
                matches!(e, voice_agent_core::Error::Transcription(m) if m == "stt")
            }),
            (PipelineError::Synthesis("tts".into()), |e| {
                matches!(e, voice_agent_core::Error::Synthesis(m) if m == "tts")
            }),
            (PipelineError::Configuration("cfg".into()), |e| {
                matches!(e, voice_agent_core::Error::Configuration(m) if m == "cfg")
            }),
        ];
        for (err, expected) in cases {
            assert!(expected(&err.into()));
        }
    }
}
