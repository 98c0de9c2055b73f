//! Audio assembly
//!
//! Synthesizes each verse in order and concatenates the encoded bytes as-is.
//! No silence padding is inserted between verses.

use std::sync::Arc;

use voice_agent_core::TextToSpeech;

use crate::verse::Verse;
use crate::PipelineError;

/// All-or-nothing verse synthesizer
pub struct AudioAssembler {
    tts: Arc<dyn TextToSpeech>,
}

impl AudioAssembler {
    pub fn new(tts: Arc<dyn TextToSpeech>) -> Self {
        Self { tts }
    }

    /// Synthesize every verse, one call each, in order.
    ///
    /// The first failure aborts the assembly and discards audio produced so far.
    pub async fn synthesize(&self, verses: &[Verse]) -> Result<Vec<u8>, PipelineError> {
        let mut audio = Vec::new();

        for (i, verse) in verses.iter().enumerate() {
            let bytes = self.tts.synthesize(verse).await.map_err(|e| {
                tracing::warn!(verse = i, error = %e, "Verse synthesis failed");
                match e {
                    voice_agent_core::Error::Synthesis(msg) => PipelineError::Synthesis(msg),
                    other => PipelineError::Synthesis(other.to_string()),
                }
            })?;
            audio.extend_from_slice(&bytes);
        }

        tracing::debug!(
            verses = verses.len(),
            bytes = audio.len(),
            model = self.tts.model_name(),
            "Assembled reply audio"
        );
        Ok(audio)
    }
}
