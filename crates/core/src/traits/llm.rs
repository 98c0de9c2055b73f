//! Language model trait

use crate::llm_types::{GenerateRequest, GenerateResponse, ToolDefinition};
use crate::Result;
use async_trait::async_trait;

/// Language model interface
///
/// # Example
///
/// ```ignore
/// let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIBackend::new(config)?);
/// let request = GenerateRequest::new("You are a museum guide")
///     .with_user_message("When do you open?");
/// let response = llm.generate_with_tools(request, &tools).await?;
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate a response without tools
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Generate a response, letting the model request tool calls
    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> Result<GenerateResponse>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_types::Message;

    struct EchoLlm;

    #[async_trait]
    impl LanguageModel for EchoLlm {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(GenerateResponse::text(last))
        }

        async fn generate_with_tools(
            &self,
            request: GenerateRequest,
            _tools: &[ToolDefinition],
        ) -> Result<GenerateResponse> {
            self.generate(request).await
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_trait_object() {
        let llm: Box<dyn LanguageModel> = Box::new(EchoLlm);
        let request = GenerateRequest::from_messages(vec![Message::user("hello")]);
        let response = llm.generate_with_tools(request, &[]).await.unwrap();
        assert_eq!(response.text, "hello");
        assert!(!response.has_tool_calls());
    }
}
