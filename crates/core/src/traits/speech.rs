//! Speech processing traits

use crate::Result;
use async_trait::async_trait;

/// Speech-to-Text interface
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(HttpSttClient::new(config)?);
/// let text = stt.transcribe(&bytes, "recording.ogg").await?;
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe a complete audio recording
    ///
    /// # Arguments
    /// * `audio` - Encoded audio bytes as received
    /// * `file_name` - Original file name, used by providers to sniff the format
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech interface
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text to encoded audio bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
