//! Voice Agent Server
//!
//! HTTP surface for the museum voice guide: the speech relay webhook,
//! tool endpoints, dialogue sessions, health and Prometheus metrics.

pub mod http;
pub mod metrics;
pub mod session;
pub mod state;
pub mod webhook;

pub use crate::http::create_router;
pub use crate::metrics::{init_metrics, metrics_handler, record_session_created, record_webhook};
pub use session::SessionManager;
pub use state::{build_tool_registry, load_index, AppState};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use voice_agent_agent::AgentError;
use voice_agent_tools::ToolError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session error: {0}")]
    Session(String),

    /// Too many live sessions
    #[error("Server busy: {0}")]
    Capacity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// A provider behind the server failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Session(_) => StatusCode::NOT_FOUND,
            ServerError::Capacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Startup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = StatusCode::from(self);
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<ToolError> for ServerError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(_) => ServerError::NotFound(err.to_string()),
            ToolError::InvalidParams(_) => ServerError::InvalidRequest(err.to_string()),
            ToolError::Timeout { .. } => ServerError::Timeout(err.to_string()),
            ToolError::Execution(_) => ServerError::Internal(err.to_string()),
        }
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::SessionEnded => ServerError::Session(err.to_string()),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: &voice_agent_config::ObservabilityConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("voice_agent={},build_index={},tower_http=debug", config.log_level, config.log_level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::Capacity("full".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ServerError::Session("ended".into()), StatusCode::NOT_FOUND),
            (ServerError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (ServerError::Timeout("slow".into()), StatusCode::GATEWAY_TIMEOUT),
            (ServerError::Upstream("down".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(StatusCode::from(err), status);
        }
    }
}
