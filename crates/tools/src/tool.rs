//! Tool trait and schema types
//!
//! A tool declares its parameters as a JSON-Schema object
//! ([`InputSchema`]) and returns text content blocks.
//!
//! # Example
//!
//! ```ignore
//! use voice_agent_tools::{Tool, ToolSchema, ToolOutput, ToolError};
//!
//! struct Clock;
//!
//! #[async_trait]
//! impl Tool for Clock {
//!     fn name(&self) -> &str { "clock" }
//!     fn description(&self) -> &str { "Current time" }
//!     fn schema(&self) -> ToolSchema { /* ... */ }
//!     async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> { /* ... */ }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use voice_agent_config::constants::timeouts;
use voice_agent_core::ToolDefinition;

/// Tool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Arguments rejected by the declared schema
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Tool '{tool}' timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("Execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    pub fn timeout(tool_name: &str, timeout_secs: u64) -> Self {
        Self::Timeout {
            tool: tool_name.to_string(),
            secs: timeout_secs,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

/// Tool output with content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    /// Is this an error response?
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    /// Create a text output
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Create an error output
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// All text blocks joined with newlines
    pub fn to_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Content block types for tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

/// Tool schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    /// Shown to the reasoning service
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Parameter schema as a JSON value
    pub fn parameters(&self) -> Value {
        serde_json::to_value(&self.input_schema)
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
    }

    /// Function definition for the reasoning service
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name.clone(), self.description.clone(), self.parameters())
    }
}

/// Input schema for tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    /// Always "object" for tool inputs
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    /// Create an empty object schema
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a property to the schema
    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

/// Property schema for input parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    /// string, number, integer, boolean
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    fn typed(prop_type: &str, description: impl Into<String>) -> Self {
        Self {
            prop_type: prop_type.to_string(),
            description: Some(description.into()),
            enum_values: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::typed("number", description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::typed("integer", description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::typed("boolean", description)
    }

    /// String restricted to the given values
    pub fn enum_type(description: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            enum_values: Some(values),
            ..Self::typed("string", description)
        }
    }
}

/// Tool callable by the reasoning service
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used for invocation
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    /// Execute with already-validated arguments
    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Per-tool timeout in seconds
    fn timeout_secs(&self) -> u64 {
        timeouts::TOOL_SECS
    }
}

/// Read a required string argument
pub(crate) fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    input
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::invalid_params(format!("Missing required field: {}", field)))
}
