//! Tool Registry
//!
//! Maps tool names to handlers, validates arguments against each tool's
//! declared schema and executes under a per-tool timeout.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use voice_agent_core::ToolDefinition;

use crate::tool::{Tool, ToolError, ToolOutput, ToolSchema};

/// Tool executor trait
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// List available tools, ordered by name
    fn list_tools(&self) -> Vec<ToolSchema>;

    /// Get tool schema by name
    fn get_tool(&self, name: &str) -> Option<ToolSchema>;

    /// Function definitions advertised to the reasoning service
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools().iter().map(ToolSchema::to_definition).collect()
    }
}

/// Tool registry
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    timeout_cap_secs: Option<u64>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp every tool's own timeout to at most `secs`
    pub fn with_timeout_cap(mut self, secs: u64) -> Self {
        self.timeout_cap_secs = Some(secs.max(1));
        self
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Replaced previously registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Sorted tool names
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Check arguments against the tool's JSON Schema
fn validate_arguments(schema: &ToolSchema, arguments: &Value) -> Result<(), ToolError> {
    let schema_value = schema.parameters();
    let compiled = jsonschema::JSONSchema::compile(&schema_value).map_err(|e| {
        ToolError::execution(format!("Tool '{}' declares an invalid schema: {}", schema.name, e))
    })?;

    if let Err(errors) = compiled.validate(arguments) {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(ToolError::invalid_params(messages.join("; ")));
    }

    Ok(())
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::not_found(name))?;

        validate_arguments(&tool.schema(), &arguments)?;

        let timeout_secs = match self.timeout_cap_secs {
            Some(cap) => tool.timeout_secs().min(cap),
            None => tool.timeout_secs(),
        };
        let started = Instant::now();

        tracing::trace!(tool = name, timeout_secs, "Executing tool with timeout");

        let result =
            match tokio::time::timeout(Duration::from_secs(timeout_secs), tool.execute(arguments))
                .await
            {
                Ok(result) => result,
                Err(_elapsed) => Err(ToolError::timeout(name, timeout_secs)),
            };

        tracing::debug!(
            tool = name,
            success = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Tool call finished"
        );

        result
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    fn get_tool(&self, name: &str) -> Option<ToolSchema> {
        self.tools.get(name).map(|t| t.schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{InputSchema, PropertySchema};
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo a message"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new(
                "echo",
                self.description(),
                InputSchema::object()
                    .property("message", PropertySchema::string("Text to echo"), true)
                    .property("times", PropertySchema::integer("Repeat count"), false),
            )
        }

        async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
            let message = crate::tool::required_str(&input, "message")?;
            let times = input.get("times").and_then(Value::as_u64).unwrap_or(1) as usize;
            Ok(ToolOutput::text(message.repeat(times)))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("slow", self.description(), InputSchema::object())
        }

        async fn execute(&self, _input: Value) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ToolOutput::text("late"))
        }

        fn timeout_secs(&self) -> u64 {
            1
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        registry.register(SlowTool);
        registry
    }

    #[tokio::test]
    async fn test_execute_valid_arguments() {
        let output = registry()
            .execute("echo", json!({ "message": "ab", "times": 2 }))
            .await
            .unwrap();
        assert_eq!(output.to_text(), "abab");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = registry().execute("missing", json!({})).await;
        assert_eq!(result, Err(ToolError::NotFound("missing".to_string())));
    }

    #[tokio::test]
    async fn test_schema_violations_rejected() {
        let registry = registry();

        let missing = registry.execute("echo", json!({})).await;
        assert!(matches!(missing, Err(ToolError::InvalidParams(_))));

        let wrong_type = registry
            .execute("echo", json!({ "message": "a", "times": "two" }))
            .await;
        assert!(matches!(wrong_type, Err(ToolError::InvalidParams(_))));

        let not_object = registry.execute("echo", json!("hello")).await;
        assert!(matches!(not_object, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let result = registry().execute("slow", json!({})).await;
        assert_eq!(result, Err(ToolError::timeout("slow", 1)));
    }

    #[tokio::test]
    async fn test_timeout_cap_never_extends_tool_timeout() {
        let registry = registry().with_timeout_cap(5);
        let result = registry.execute("slow", json!({})).await;
        assert_eq!(result, Err(ToolError::timeout("slow", 1)));

        let output = registry
            .execute("echo", json!({ "message": "x" }))
            .await
            .unwrap();
        assert_eq!(output.to_text(), "x");
    }

    #[test]
    fn test_listing_is_sorted() {
        let registry = registry();
        let names: Vec<String> = registry.list_tools().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["echo", "slow"]);
        assert_eq!(registry.tool_names(), names);

        let defs = registry.definitions();
        assert_eq!(defs[0].parameters["required"], json!(["message"]));
    }
}
