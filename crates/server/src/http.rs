//! HTTP Endpoints
//!
//! REST API for the voice agent.

use axum::{
    extract::{DefaultBodyLimit, Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use voice_agent_agent::{SessionConfig, UsageSummary};
use voice_agent_tools::ToolExecutor;

use crate::metrics::{metrics_handler, record_session_created};
use crate::state::AppState;
use crate::webhook::webhook;
use crate::ServerError;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let body_limit = server.max_upload_bytes;
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        // Messaging integration
        .route("/webhook", post(webhook))
        // Session endpoints
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id/messages", post(send_message))
        .route("/api/sessions/:id", delete(end_session))
        // Tool endpoints
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(call_tool))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If no configured origin parses, defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let mut parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", FALLBACK_ORIGIN);
        parsed_origins.push(HeaderValue::from_static(FALLBACK_ORIGIN));
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let index_chunks = state.retriever.as_ref().map(|r| r.indexed_chunks());

    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "index_loaded": index_chunks.is_some(),
            "index_chunks": index_chunks.unwrap_or(0),
            "tools": state.tools.len(),
            "sessions": state.sessions.count(),
        }
    }))
}

/// List available tools
async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    let tools: Vec<_> = state
        .tools
        .list_tools()
        .into_iter()
        .map(|schema| {
            let parameters = schema.parameters();
            serde_json::json!({
                "name": schema.name,
                "description": schema.description,
                "parameters": parameters,
            })
        })
        .collect();

    Json(tools)
}

#[derive(Debug, Deserialize)]
struct CallToolRequest {
    #[serde(default = "empty_arguments")]
    arguments: serde_json::Value,
}

fn empty_arguments() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Debug, Serialize)]
struct CallToolResponse {
    tool: String,
    result: String,
    is_error: bool,
}

/// Call a tool directly
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<CallToolRequest>,
) -> Result<Json<CallToolResponse>, ServerError> {
    let output = state.tools.execute(&name, request.arguments).await?;

    Ok(Json(CallToolResponse {
        result: output.to_text(),
        is_error: output.is_error,
        tool: name,
    }))
}

#[derive(Debug, Serialize)]
struct CreateSessionResponse {
    session_id: String,
    welcome: String,
    reply: String,
}

/// Create a dialogue session and run its opening turn
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ServerError> {
    let config = SessionConfig::from_settings(&state.config.agent, &state.config.llm);
    let session = state
        .sessions
        .create(config, state.llm.clone(), state.tools.clone())?;
    record_session_created();

    let opening = match session.start().await {
        Ok(opening) => opening,
        Err(e) => {
            state.sessions.remove(session.id());
            let _ = session.end().await;
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id().to_string(),
            welcome: opening.welcome,
            reply: opening.reply,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    reply: String,
}

/// One user turn
async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::NotFound(format!("Session {}", id)))?;

    let text = request.text.trim();
    if text.is_empty() {
        return Err(ServerError::InvalidRequest("Message text is empty".to_string()));
    }

    session.touch();
    let reply = session.respond(text).await?;
    Ok(Json(MessageResponse { reply }))
}

/// End a session and report its usage
async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UsageSummary>, ServerError> {
    let session = state
        .sessions
        .remove(&id)
        .ok_or_else(|| ServerError::NotFound(format!("Session {}", id)))?;

    let summary = session.end().await?;
    Ok(Json(summary))
}
