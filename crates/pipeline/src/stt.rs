//! HTTP speech-to-text client
//!
//! OpenAI-compatible `/audio/transcriptions`: multipart upload of the raw
//! recording plus the model name, JSON `{ "text": ... }` back.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use voice_agent_config::constants::{endpoints, speech, timeouts};
use voice_agent_config::{ProvidersConfig, SttConfig};
use voice_agent_core::SpeechToText;

use crate::PipelineError;

/// STT client configuration
#[derive(Debug, Clone)]
pub struct HttpSttConfig {
    /// API base URL (without `/audio/transcriptions`)
    pub endpoint: String,
    pub model: String,
    /// Language hint (e.g., "th")
    pub language: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpSttConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::PROVIDER_BASE_URL.to_string(),
            model: speech::STT_MODEL.to_string(),
            language: None,
            api_key: None,
            timeout: Duration::from_secs(timeouts::PROVIDER_SECS),
        }
    }
}

impl HttpSttConfig {
    pub fn from_settings(providers: &ProvidersConfig, stt: &SttConfig) -> Self {
        Self {
            endpoint: providers.base_url.clone(),
            model: stt.model.clone(),
            language: stt.language.clone(),
            api_key: providers.resolved_api_key(),
            timeout: Duration::from_secs(providers.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// HTTP STT client
pub struct HttpSttClient {
    client: Client,
    config: HttpSttConfig,
}

impl HttpSttClient {
    pub fn new(config: HttpSttConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    fn transcriptions_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    async fn transcribe_bytes(&self, audio: &[u8], file_name: &str) -> Result<String, PipelineError> {
        let file = Part::bytes(audio.to_vec()).file_name(file_name.to_string());
        let mut form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone());
        if let Some(ref language) = self.config.language {
            form = form.text("language", language.clone());
        }

        let mut request = self.client.post(self.transcriptions_url()).multipart(form);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Transcription(format!("STT request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Transcription(format!(
                "STT API error: {} - {}",
                status, body
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Transcription(format!("Failed to parse STT response: {}", e)))?;

        Ok(parsed.text)
    }
}

#[async_trait]
impl SpeechToText for HttpSttClient {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> voice_agent_core::Result<String> {
        Ok(self.transcribe_bytes(audio, file_name).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
