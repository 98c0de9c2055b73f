//! Tools for the voice agent
//!
//! Tools are registered by name with a declared JSON-Schema parameter
//! object. The registry validates arguments and runs each call under a
//! timeout; the agent advertises the schemas to the reasoning service.

pub mod document_qa;
pub mod registry;
pub mod tool;
pub mod weather;

pub use document_qa::{MuseumQaTool, MUSEUM_QA_TOOL};
pub use registry::{ToolExecutor, ToolRegistry};
pub use tool::{ContentBlock, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};
pub use weather::{WeatherTool, WEATHER_TOOL};

impl From<ToolError> for voice_agent_core::Error {
    fn from(err: ToolError) -> Self {
        voice_agent_core::Error::Tool(err.to_string())
    }
}
