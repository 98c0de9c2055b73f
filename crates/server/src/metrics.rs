//! Observability Metrics
//!
//! Prometheus recorder setup and the `/metrics` endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

pub const WEBHOOK_REQUESTS: &str = "voice_agent_webhook_requests_total";
pub const SESSIONS_CREATED: &str = "voice_agent_sessions_created_total";
pub const SESSIONS_ACTIVE: &str = "voice_agent_sessions_active";

/// Install the global Prometheus recorder
///
/// Call once at startup, before anything records.
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Startup(format!("Failed to install Prometheus recorder: {}", e)))?;

    counter!(SESSIONS_CREATED).absolute(0);
    gauge!(SESSIONS_ACTIVE).set(0.0);

    Ok(handle)
}

/// Count a webhook request by how far it got
pub fn record_webhook(outcome: &'static str) {
    counter!(WEBHOOK_REQUESTS, "outcome" => outcome).increment(1);
}

pub fn record_session_created() {
    counter!(SESSIONS_CREATED).increment(1);
}

pub fn record_active_sessions(count: usize) {
    gauge!(SESSIONS_ACTIVE).set(count as f64);
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    record_active_sessions(state.sessions.count());

    match state.metrics.as_ref() {
        Some(handle) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "metrics disabled".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_outcomes_rendered() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_webhook("forwarded");
            record_webhook("forwarded");
            record_webhook("missing_file");
            record_active_sessions(3);
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"voice_agent_webhook_requests_total{outcome="forwarded"} 2"#));
        assert!(rendered.contains(r#"voice_agent_webhook_requests_total{outcome="missing_file"} 1"#));
        assert!(rendered.contains("voice_agent_sessions_active 3"));
    }
}
