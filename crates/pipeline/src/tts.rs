//! HTTP speech synthesis client
//!
//! OpenAI-compatible `/audio/speech`: JSON `{model, voice, input}` in,
//! encoded audio bytes out.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use voice_agent_config::constants::{endpoints, speech, timeouts};
use voice_agent_config::{ProvidersConfig, TtsConfig};
use voice_agent_core::TextToSpeech;

use crate::PipelineError;

/// TTS client configuration
#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    /// API base URL (without `/audio/speech`)
    pub endpoint: String,
    pub model: String,
    pub voice: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::PROVIDER_BASE_URL.to_string(),
            model: speech::TTS_MODEL.to_string(),
            voice: speech::TTS_VOICE.to_string(),
            api_key: None,
            timeout: Duration::from_secs(timeouts::PROVIDER_SECS),
        }
    }
}

impl HttpTtsConfig {
    pub fn from_settings(providers: &ProvidersConfig, tts: &TtsConfig) -> Self {
        Self {
            endpoint: providers.base_url.clone(),
            model: tts.model.clone(),
            voice: tts.voice.clone(),
            api_key: providers.resolved_api_key(),
            timeout: Duration::from_secs(providers.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

/// HTTP TTS client
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsConfig,
}

impl HttpTtsClient {
    pub fn new(config: HttpTtsConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.config.endpoint.trim_end_matches('/'))
    }

    async fn synthesize_text(&self, text: &str) -> Result<Vec<u8>, PipelineError> {
        let body = SpeechRequest {
            model: &self.config.model,
            voice: &self.config.voice,
            input: text,
        };

        let mut request = self.client.post(self.speech_url()).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Synthesis(format!("TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Synthesis(format!(
                "TTS API error: {} - {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Synthesis(format!("Failed to read TTS audio: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TextToSpeech for HttpTtsClient {
    async fn synthesize(&self, text: &str) -> voice_agent_core::Result<Vec<u8>> {
        Ok(self.synthesize_text(text).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn test_synthesize_returns_body_bytes() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|Json(body): Json<Value>| async move {
                format!("{}|{}|{}", body["model"], body["voice"], body["input"]).into_bytes()
            }),
        );
        let client = HttpTtsClient::new(HttpTtsConfig {
            endpoint: spawn(router).await,
            ..Default::default()
        })
        .unwrap();

        let audio = client.synthesize("สวัสดี").await.unwrap();
        assert_eq!(
            String::from_utf8(audio).unwrap(),
            r#""gpt-4o-mini-tts"|"alloy"|"สวัสดี""#
        );
    }

    #[tokio::test]
    async fn test_server_error_is_synthesis_error() {
        let router = Router::new().route(
            "/v1/audio/speech",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = HttpTtsClient::new(HttpTtsConfig {
            endpoint: spawn(router).await,
            ..Default::default()
        })
        .unwrap();

        let result = client.synthesize("hi").await;
        assert!(matches!(result, Err(voice_agent_core::Error::Synthesis(_))));
    }
}
