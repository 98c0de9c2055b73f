//! Webhook relay orchestration
//!
//! STT → verses → assembled audio → forwarding, strictly in order for one
//! request. Every failure after input validation becomes structured data in
//! [`RelayOutcome::llm_response`].

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use voice_agent_core::SpeechToText;

use crate::assembler::AudioAssembler;
use crate::forwarding::{ForwardResult, ForwardingClient};
use crate::metric_names;
use crate::verse::{Verse, VerseSegmenter};

/// Where a relay run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    Forwarded,
    TranscriptionFailed,
    SynthesisFailed,
    ForwardingFailed,
}

impl RelayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayStatus::Forwarded => "forwarded",
            RelayStatus::TranscriptionFailed => "transcription_failed",
            RelayStatus::SynthesisFailed => "synthesis_failed",
            RelayStatus::ForwardingFailed => "forwarding_failed",
        }
    }
}

/// Webhook response body
#[derive(Debug, Clone, Serialize)]
pub struct RelayOutcome {
    pub received_text: String,
    pub verses: Vec<Verse>,
    pub llm_response: ForwardResult,
    #[serde(skip)]
    pub status: RelayStatus,
}

/// One-shot speech relay
pub struct SpeechRelay {
    stt: Arc<dyn SpeechToText>,
    segmenter: VerseSegmenter,
    assembler: AudioAssembler,
    forwarder: ForwardingClient,
}

impl SpeechRelay {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        segmenter: VerseSegmenter,
        assembler: AudioAssembler,
        forwarder: ForwardingClient,
    ) -> Self {
        Self {
            stt,
            segmenter,
            assembler,
            forwarder,
        }
    }

    /// Run the full relay for one uploaded recording
    pub async fn process(&self, audio: &[u8], file_name: &str) -> RelayOutcome {
        let started = Instant::now();

        let stage = Instant::now();
        let transcript = self.stt.transcribe(audio, file_name).await;
        record_stage("transcription", stage);

        let received_text = match transcript {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, file_name, "Transcription failed");
                return self.finish(
                    started,
                    RelayOutcome {
                        received_text: String::new(),
                        verses: Vec::new(),
                        llm_response: ForwardResult::failed(e.to_string()),
                        status: RelayStatus::TranscriptionFailed,
                    },
                );
            }
        };

        let verses = self.segmenter.segment(&received_text);
        tracing::debug!(
            chars = received_text.chars().count(),
            verses = verses.len(),
            "Segmented transcript"
        );

        let stage = Instant::now();
        let synthesized = self.assembler.synthesize(&verses).await;
        record_stage("synthesis", stage);

        let audio_out = match synthesized {
            Ok(bytes) => bytes,
            Err(e) => {
                return self.finish(
                    started,
                    RelayOutcome {
                        received_text,
                        verses,
                        llm_response: ForwardResult::failed(e.to_string()),
                        status: RelayStatus::SynthesisFailed,
                    },
                );
            }
        };

        let stage = Instant::now();
        let llm_response = self.forwarder.forward(&received_text, &audio_out).await;
        record_stage("forwarding", stage);

        let status = if llm_response.is_failed() {
            metrics::counter!(metric_names::FORWARD_FAILURES).increment(1);
            RelayStatus::ForwardingFailed
        } else {
            RelayStatus::Forwarded
        };

        self.finish(
            started,
            RelayOutcome {
                received_text,
                verses,
                llm_response,
                status,
            },
        )
    }

    fn finish(&self, started: Instant, outcome: RelayOutcome) -> RelayOutcome {
        record_stage("total", started);
        tracing::info!(
            status = outcome.status.as_str(),
            verses = outcome.verses.len(),
            endpoint = self.forwarder.endpoint(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Relay finished"
        );
        outcome
    }
}

fn record_stage(stage: &'static str, since: Instant) {
    metrics::histogram!(metric_names::STAGE_SECONDS, "stage" => stage)
        .record(since.elapsed().as_secs_f64());
}
