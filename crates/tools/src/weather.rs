//! Weather lookup tool
//!
//! Returns a fixed forecast. The reasoning service estimates coordinates
//! itself; they are accepted but not used.

use async_trait::async_trait;
use serde_json::Value;

use voice_agent_config::DialogueConfig;

use crate::tool::{required_str, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

pub const WEATHER_TOOL: &str = "lookup_weather";

const DESCRIPTION: &str = "Called when the user asks for weather related information. \
Ensure the user's location (city or region) is provided. When given a location, \
please estimate the latitude and longitude of the location and do not ask the user for them.";

pub struct WeatherTool {
    response: String,
}

impl WeatherTool {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    pub fn from_config(config: &DialogueConfig) -> Self {
        Self::new(config.weather_response.clone())
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::from_config(&DialogueConfig::default())
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        WEATHER_TOOL
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            WEATHER_TOOL,
            DESCRIPTION,
            InputSchema::object()
                .property(
                    "location",
                    PropertySchema::string("The location they are asking for"),
                    true,
                )
                .property(
                    "latitude",
                    PropertySchema::string("The latitude of the location, do not ask user for it"),
                    true,
                )
                .property(
                    "longitude",
                    PropertySchema::string("The longitude of the location, do not ask user for it"),
                    true,
                ),
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let location = required_str(&input, "location")?;
        tracing::info!(location, "Looking up weather");
        Ok(ToolOutput::text(self.response.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ToolExecutor, ToolRegistry};
    use serde_json::json;

    #[tokio::test]
    async fn test_canned_response() {
        let output = WeatherTool::default()
            .execute(json!({ "location": "Bangkok", "latitude": "13.75", "longitude": "100.5" }))
            .await
            .unwrap();
        assert_eq!(output.to_text(), "sunny with a temperature of 70 degrees.");
    }

    #[tokio::test]
    async fn test_coordinates_required_by_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(WeatherTool::new("rainy"));

        let result = registry
            .execute(WEATHER_TOOL, json!({ "location": "Chiang Mai" }))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));

        let output = registry
            .execute(
                WEATHER_TOOL,
                json!({ "location": "Chiang Mai", "latitude": "18.8", "longitude": "98.9" }),
            )
            .await
            .unwrap();
        assert_eq!(output.to_text(), "rainy");
    }
}
