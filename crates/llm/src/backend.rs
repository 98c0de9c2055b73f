//! OpenAI-compatible chat backend
//!
//! Talks to `/chat/completions` on OpenAI or any compatible server (vLLM,
//! llama.cpp server, LocalAI). Tool definitions are sent as `function` tools
//! with `tool_choice: "auto"`; tool calls in the reply are decoded into
//! [`ToolCall`] with their JSON argument strings parsed.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use voice_agent_config::constants::{endpoints, llm, timeouts};
use voice_agent_config::{LlmConfig, ProvidersConfig};
use voice_agent_core::{
    FinishReason, GenerateRequest, GenerateResponse, LanguageModel, Message, Role, TokenUsage,
    ToolCall, ToolDefinition,
};

use crate::LlmError;

/// OpenAI API configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API endpoint (e.g., "https://api.openai.com/v1")
    pub endpoint: String,
    /// API key (may be empty for local servers)
    pub api_key: String,
    /// Model name
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::PROVIDER_BASE_URL.to_string(),
            api_key: String::new(),
            model: llm::MODEL.to_string(),
            max_tokens: llm::MAX_TOKENS,
            temperature: llm::TEMPERATURE,
            timeout: Duration::from_secs(timeouts::PROVIDER_SECS),
        }
    }
}

impl OpenAIConfig {
    pub fn from_settings(providers: &ProvidersConfig, llm: &LlmConfig) -> Self {
        Self {
            endpoint: providers.base_url.clone(),
            api_key: providers.resolved_api_key().unwrap_or_default(),
            model: llm.model.clone(),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            timeout: Duration::from_secs(providers.timeout_secs),
        }
    }

    fn is_local(&self) -> bool {
        self.endpoint.starts_with("http://localhost") || self.endpoint.starts_with("http://127.0.0.1")
    }
}

/// OpenAI-compatible backend
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() && !config.is_local() {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.config.api_key.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    fn build_request(
        &self,
        request: &GenerateRequest,
        tools: &[ToolDefinition],
    ) -> OpenAIChatRequest {
        let tools: Vec<OpenAITool> = tools.iter().map(OpenAITool::from).collect();
        OpenAIChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            tool_choice: (!tools.is_empty()).then(|| "auto".to_string()),
            tools,
        }
    }

    async fn chat(
        &self,
        request: &GenerateRequest,
        tools: &[ToolDefinition],
    ) -> Result<GenerateResponse, LlmError> {
        let body = self.build_request(request, tools);

        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, text)));
        }

        let parsed: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
            _ if !tool_calls.is_empty() => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        };

        tracing::debug!(
            ?finish_reason,
            tool_calls = tool_calls.len(),
            prompt_tokens = usage.map(|u| u.prompt_tokens).unwrap_or(0),
            completion_tokens = usage.map(|u| u.completion_tokens).unwrap_or(0),
            "Chat completion received"
        );

        Ok(GenerateResponse {
            text: choice.message.content.unwrap_or_default(),
            finish_reason,
            usage,
            tool_calls,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIBackend {
    async fn generate(&self, request: GenerateRequest) -> voice_agent_core::Result<GenerateResponse> {
        Ok(self.chat(&request, &[]).await?)
    }

    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> voice_agent_core::Result<GenerateResponse> {
        Ok(self.chat(&request, tools).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI wire types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAITool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAIToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for OpenAIMessage {
    fn from(msg: &Message) -> Self {
        // Assistant turns that only carry tool calls go out with null content
        let content = if msg.role == Role::Assistant
            && msg.content.is_empty()
            && !msg.tool_calls.is_empty()
        {
            None
        } else {
            Some(msg.content.clone())
        };

        Self {
            role: msg.role.as_str(),
            content,
            tool_calls: msg.tool_calls.iter().map(OpenAIToolCall::from).collect(),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAIFunctionDef,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

impl From<&ToolDefinition> for OpenAITool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: OpenAIFunctionDef {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAIFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    /// JSON-encoded arguments object
    #[serde(default)]
    arguments: String,
}

impl From<&ToolCall> for OpenAIToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: OpenAIFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments_value().to_string(),
            },
        }
    }
}

impl TryFrom<OpenAIToolCall> for ToolCall {
    type Error = LlmError;

    fn try_from(call: OpenAIToolCall) -> Result<Self, Self::Error> {
        let raw = call.function.arguments.trim();
        let arguments: HashMap<String, serde_json::Value> = if raw.is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(raw).map_err(|e| {
                LlmError::InvalidResponse(format!(
                    "Tool call '{}' has malformed arguments: {}",
                    call.function.name, e
                ))
            })?
        };

        Ok(ToolCall {
            id: call.id,
            name: call.function.name,
            arguments,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    /// Absent or `null` when the model answered in text
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn local_backend(endpoint: String) -> OpenAIBackend {
        OpenAIBackend::new(OpenAIConfig {
            endpoint,
            ..Default::default()
        })
        .unwrap()
    }

    fn weather_tool() -> ToolDefinition {
        ToolDefinition::new(
            "lookup_weather",
            "Look up weather information for a given location",
            json!({
                "type": "object",
                "properties": { "location": { "type": "string" } },
                "required": ["location"]
            }),
        )
    }

    #[test]
    fn test_remote_endpoint_requires_key() {
        let result = OpenAIBackend::new(OpenAIConfig::default());
        assert!(matches!(result, Err(LlmError::Configuration(_))));

        let local = OpenAIBackend::new(OpenAIConfig {
            endpoint: "http://localhost:8080/v1".to_string(),
            ..Default::default()
        });
        assert!(local.is_ok());
    }

    #[test]
    fn test_from_settings() {
        let providers = ProvidersConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let config = OpenAIConfig::from_settings(&providers, &LlmConfig::default());
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-3.5-turbo-1106");
    }

    #[test]
    fn test_assistant_tool_call_message_has_null_content() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "lookup_weather".to_string(),
            arguments: HashMap::from([("location".to_string(), json!("Bangkok"))]),
        };
        let wire = OpenAIMessage::from(&Message::assistant_tool_calls("", vec![call]));
        let value = serde_json::to_value(&wire).unwrap();

        assert_eq!(value["role"], "assistant");
        assert!(value["content"].is_null());
        assert_eq!(value["tool_calls"][0]["type"], "function");
        let args: Value =
            serde_json::from_str(value["tool_calls"][0]["function"]["arguments"].as_str().unwrap())
                .unwrap();
        assert_eq!(args["location"], "Bangkok");

        let tool = serde_json::to_value(OpenAIMessage::from(&Message::tool("sunny", "call_1"))).unwrap();
        assert_eq!(tool["tool_call_id"], "call_1");
        assert_eq!(tool["content"], "sunny");
    }

    #[tokio::test]
    async fn test_generate_text_reply() {
        let seen = Arc::new(Mutex::new(Value::Null));
        let captured = seen.clone();
        let base = spawn(Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = body;
                    Json(json!({
                        "choices": [{
                            "message": { "role": "assistant", "content": "สวัสดีค่ะ" },
                            "finish_reason": "stop"
                        }],
                        "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 }
                    }))
                }
            }),
        ))
        .await;

        let backend = local_backend(base);
        let response = backend
            .generate(GenerateRequest::new("guide").with_user_message("hello"))
            .await
            .unwrap();

        assert_eq!(response.text, "สวัสดีค่ะ");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage, Some(TokenUsage::new(12, 4)));

        let body = seen.lock().unwrap().clone();
        assert_eq!(body["model"], "gpt-3.5-turbo-1106");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[tokio::test]
    async fn test_generate_with_tools_decodes_tool_calls() {
        let seen = Arc::new(Mutex::new(Value::Null));
        let captured = seen.clone();
        let base = spawn(Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = body;
                    Json(json!({
                        "choices": [{
                            "message": {
                                "role": "assistant",
                                "content": null,
                                "tool_calls": [{
                                    "id": "call_abc",
                                    "type": "function",
                                    "function": {
                                        "name": "lookup_weather",
                                        "arguments": "{\"location\":\"Bangkok\",\"latitude\":\"13.7\"}"
                                    }
                                }]
                            },
                            "finish_reason": "tool_calls"
                        }]
                    }))
                }
            }),
        ))
        .await;

        let backend = local_backend(base);
        let response = backend
            .generate_with_tools(
                GenerateRequest::new("guide").with_user_message("weather?"),
                &[weather_tool()],
            )
            .await
            .unwrap();

        assert!(response.text.is_empty());
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].get_string("location"), Some("Bangkok"));

        let body = seen.lock().unwrap().clone();
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "lookup_weather");
    }

    #[tokio::test]
    async fn test_null_tool_calls_is_plain_answer() {
        let base = spawn(Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                Json(json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": "พิพิธภัณฑ์เปิดเก้าโมงค่ะ",
                            "tool_calls": null
                        },
                        "finish_reason": "stop"
                    }]
                }))
            }),
        ))
        .await;

        let response = local_backend(base)
            .generate_with_tools(
                GenerateRequest::new("guide").with_user_message("open?"),
                &[weather_tool()],
            )
            .await
            .unwrap();

        assert_eq!(response.text, "พิพิธภัณฑ์เปิดเก้าโมงค่ะ");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let base = spawn(Router::new().route(
            "/v1/chat/completions",
            post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        ))
        .await;

        let result = local_backend(base).chat(&GenerateRequest::new("guide"), &[]).await;
        match result {
            Err(LlmError::Api(msg)) => assert!(msg.contains("429")),
            other => panic!("expected api error, got {:?}", other.map(|r| r.text)),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let base = spawn(Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        ))
        .await;

        let result = local_backend(base).generate(GenerateRequest::new("guide")).await;
        assert!(matches!(result, Err(voice_agent_core::Error::Llm(_))));
    }
}
