//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::Arc;

use voice_agent_config::{DialogueConfig, ProvidersConfig, RagConfig, Settings};
use voice_agent_core::LanguageModel;
use voice_agent_rag::{
    DocumentRetriever, OpenAiEmbedder, OpenAiEmbeddingConfig, RagError, RetrieverConfig,
    VectorIndex,
};
use voice_agent_pipeline::SpeechRelay;
use voice_agent_tools::{MuseumQaTool, ToolRegistry, WeatherTool};

use crate::session::SessionManager;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Immutable after startup
    pub config: Arc<Settings>,
    pub relay: Arc<SpeechRelay>,
    pub tools: Arc<ToolRegistry>,
    pub llm: Arc<dyn LanguageModel>,
    pub sessions: Arc<SessionManager>,
    /// Present only when a knowledge index was loaded
    pub retriever: Option<Arc<DocumentRetriever>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Settings,
        relay: SpeechRelay,
        tools: ToolRegistry,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        let sessions = SessionManager::from_settings(&config.server);
        Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
            tools: Arc::new(tools),
            llm,
            sessions: Arc::new(sessions),
            retriever: None,
            metrics: None,
        }
    }

    pub fn with_retriever(mut self, retriever: Option<Arc<DocumentRetriever>>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Register the dialogue tools
///
/// The museum question tool is only offered when a retriever exists.
pub fn build_tool_registry(
    dialogue: &DialogueConfig,
    retriever: Option<Arc<DocumentRetriever>>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new().with_timeout_cap(dialogue.tool_timeout_secs);
    registry.register(WeatherTool::from_config(dialogue));

    match retriever {
        Some(retriever) => registry.register(MuseumQaTool::new(retriever)),
        None => tracing::warn!("No knowledge index loaded, museum questions are disabled"),
    }

    registry
}

/// Load the persisted knowledge index, if one was built
///
/// A missing index directory is not an error. An unreadable or
/// incompatible index is.
pub fn load_index(
    rag: &RagConfig,
    providers: &ProvidersConfig,
) -> Result<Option<Arc<DocumentRetriever>>, RagError> {
    let path = Path::new(&rag.index_path);
    if !path.exists() {
        tracing::warn!(
            index_path = %rag.index_path,
            "Knowledge index not found, run build-index to create it"
        );
        return Ok(None);
    }

    let embedder = Arc::new(OpenAiEmbedder::new(OpenAiEmbeddingConfig::from(providers))?);
    let index = VectorIndex::load(path, embedder)?;

    tracing::info!(
        index_path = %rag.index_path,
        chunks = index.len(),
        dimension = index.dimension(),
        model = index.model(),
        "Loaded knowledge index"
    );

    Ok(Some(Arc::new(DocumentRetriever::new(
        Arc::new(index),
        RetrieverConfig::from(rag),
    ))))
}
