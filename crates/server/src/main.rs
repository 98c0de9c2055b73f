//! Voice Agent Server Entry Point

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

use voice_agent_config::load_settings;
use voice_agent_llm::{OpenAIBackend, OpenAIConfig};
use voice_agent_pipeline::{
    AudioAssembler, ForwardingClient, ForwardingConfig, HttpSttClient, HttpSttConfig,
    HttpTtsClient, HttpTtsConfig, SpeechRelay, VerseSegmenter,
};
use voice_agent_server::{
    build_tool_registry, create_router, init_metrics, init_tracing, load_index, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.toml > config/default.toml > defaults
    let env = std::env::var("VOICE_AGENT_ENV").ok();
    let config = load_settings(env.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.observability);

    tracing::info!("Starting Voice Agent Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_env = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    // A corrupt index is fatal; a missing one only disables museum questions
    let retriever =
        load_index(&config.rag, &config.providers).context("Failed to load knowledge index")?;

    let tools = build_tool_registry(&config.agent, retriever.clone());
    tracing::info!(tools = ?tools.tool_names(), "Registered tools");

    let llm = OpenAIBackend::new(OpenAIConfig::from_settings(&config.providers, &config.llm))
        .context("Failed to create language model backend")?;

    let stt = HttpSttClient::new(HttpSttConfig::from_settings(&config.providers, &config.stt))
        .context("Failed to create speech-to-text client")?;
    let tts = HttpTtsClient::new(HttpTtsConfig::from_settings(&config.providers, &config.tts))
        .context("Failed to create speech synthesis client")?;
    let forwarder = ForwardingClient::new(ForwardingConfig::from(&config.webhook))
        .context("Failed to create forwarding client")?;
    tracing::info!(endpoint = forwarder.endpoint(), "Webhook forwarding configured");

    let relay = SpeechRelay::new(
        Arc::new(stt),
        VerseSegmenter::new(config.webhook.max_verse_words),
        AudioAssembler::new(Arc::new(tts)),
        forwarder,
    );

    let metrics_enabled = config.observability.metrics_enabled;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server bind address")?;

    let mut state = AppState::new(config, relay, tools, Arc::new(llm)).with_retriever(retriever);

    if metrics_enabled {
        state = state.with_metrics(init_metrics()?);
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let cleanup_shutdown = state.sessions.start_cleanup_task();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let _ = cleanup_shutdown.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
