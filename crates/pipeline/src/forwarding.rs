//! Best-effort forwarding to the downstream LLM server
//!
//! One multipart POST carrying `text` and an `audio` file part. Transport
//! failures come back as [`ForwardResult::Failed`], never as an `Err`, so
//! the webhook can always answer its own caller. No retries.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use voice_agent_config::constants::{endpoints, timeouts};
use voice_agent_config::WebhookConfig;

use crate::PipelineError;

/// File name of the forwarded audio part
pub const AUDIO_FILE_NAME: &str = "output.wav";

/// Content type of the forwarded audio part
pub const AUDIO_CONTENT_TYPE: &str = "audio/wav";

/// Outcome of a forwarding call
///
/// Serializes as the downstream JSON payload, or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForwardResult {
    /// Decoded JSON returned by the downstream server
    Response(Value),
    /// Transport or decoding failure
    Failed { error: String },
}

impl ForwardResult {
    pub fn failed(error: impl Into<String>) -> Self {
        ForwardResult::Failed {
            error: error.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ForwardResult::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ForwardResult::Failed { error } => Some(error),
            ForwardResult::Response(_) => None,
        }
    }
}

/// Forwarding configuration
#[derive(Debug, Clone)]
pub struct ForwardingConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::LLM_SERVER_URL.to_string(),
            timeout: Duration::from_secs(timeouts::FORWARD_SECS),
        }
    }
}

impl From<&WebhookConfig> for ForwardingConfig {
    fn from(webhook: &WebhookConfig) -> Self {
        Self {
            endpoint: webhook.llm_server_url.clone(),
            timeout: Duration::from_secs(webhook.forward_timeout_secs),
        }
    }
}

/// Downstream forwarding client
pub struct ForwardingClient {
    client: Client,
    config: ForwardingConfig,
}

impl ForwardingClient {
    pub fn new(config: ForwardingConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send `text` and `audio` downstream. Never fails.
    pub async fn forward(&self, text: &str, audio: &[u8]) -> ForwardResult {
        match self.try_forward(text, audio).await {
            Ok(value) => ForwardResult::Response(value),
            Err(e) => {
                tracing::warn!(endpoint = %self.config.endpoint, error = %e, "Forwarding failed");
                ForwardResult::failed(e.to_string())
            }
        }
    }

    async fn try_forward(&self, text: &str, audio: &[u8]) -> Result<Value, reqwest::Error> {
        let audio_part = Part::bytes(audio.to_vec())
            .file_name(AUDIO_FILE_NAME)
            .mime_str(AUDIO_CONTENT_TYPE)?;
        let form = Form::new()
            .text("text", text.to_string())
            .part("audio", audio_part);

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Downstream server returned non-success status");
        }

        response.json::<Value>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/process", addr)
    }

    async fn inspect(mut multipart: Multipart) -> Json<Value> {
        let mut text = None;
        let mut audio = None;
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => text = Some(field.text().await.unwrap()),
                "audio" => {
                    let meta = format!(
                        "{}|{}",
                        field.file_name().unwrap_or_default(),
                        field.content_type().unwrap_or_default()
                    );
                    let bytes = field.bytes().await.unwrap();
                    audio = Some(json!({ "meta": meta, "len": bytes.len() }));
                }
                _ => {}
            }
        }
        Json(json!({ "text": text, "audio": audio }))
    }

    #[test]
    fn test_serialization() {
        let failed = ForwardResult::failed("connection refused");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"error": "connection refused"})
        );

        let ok = ForwardResult::Response(json!({"reply": "hi"}));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"reply": "hi"}));
    }

    #[tokio::test]
    async fn test_forward_multipart() {
        let endpoint = spawn(Router::new().route("/process", post(inspect))).await;
        let client = ForwardingClient::new(ForwardingConfig {
            endpoint,
            ..Default::default()
        })
        .unwrap();

        let result = client.forward("สวัสดี", &[0u8; 16]).await;
        assert_eq!(
            result,
            ForwardResult::Response(json!({
                "text": "สวัสดี",
                "audio": { "meta": "output.wav|audio/wav", "len": 16 }
            }))
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_returns_error_value() {
        // port 9 (discard) is closed on test hosts
        let client = ForwardingClient::new(ForwardingConfig {
            endpoint: "http://127.0.0.1:9/process".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let result = client.forward("hello", b"RIFF").await;
        assert!(result.is_failed());
        assert!(!result.error().unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_response_is_failure() {
        let endpoint = spawn(Router::new().route("/process", post(|| async { "plain text" }))).await;
        let client = ForwardingClient::new(ForwardingConfig {
            endpoint,
            ..Default::default()
        })
        .unwrap();

        assert!(client.forward("hi", b"").await.is_failed());
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let endpoint = spawn(Router::new().route(
            "/process",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        ))
        .await;
        let client = ForwardingClient::new(ForwardingConfig {
            endpoint,
            timeout: Duration::from_millis(200),
        })
        .unwrap();

        assert!(client.forward("hi", b"").await.is_failed());
    }
}
