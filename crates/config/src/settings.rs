//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{endpoints, llm, rag, sessions, speech, timeouts};
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Index build and retrieval
    #[serde(default)]
    pub rag: RagConfig,

    /// Shared provider connection (embeddings, STT, TTS, chat)
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub stt: SttConfig,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    /// Webhook relay
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Dialogue session
    #[serde(default)]
    pub agent: DialogueConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_rag()?;
        self.validate_webhook()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.server.session_cleanup_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.session_cleanup_secs".to_string(),
                message: "Interval must be at least 1 second".to_string(),
            });
        }

        if self.server.cors_enabled && self.server.cors_origins.is_empty() {
            tracing::debug!("CORS enabled without origins, localhost fallback applies");
        }

        Ok(())
    }

    /// Validate retrieval parameters before any indexing work
    pub fn validate_rag(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;

        if rag.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.chunk_size".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rag.chunk_overlap >= rag.chunk_size {
            return Err(ConfigError::InvalidValue {
                field: "rag.chunk_overlap".to_string(),
                message: format!(
                    "Must be smaller than chunk_size ({}), got {}",
                    rag.chunk_size, rag.chunk_overlap
                ),
            });
        }

        if rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rag.max_answer_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.max_answer_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.providers.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                field: "providers.embedding_dimension".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_webhook(&self) -> Result<(), ConfigError> {
        if self.webhook.max_verse_words == 0 {
            return Err(ConfigError::InvalidValue {
                field: "webhook.max_verse_words".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.webhook.forward_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "webhook.forward_timeout_secs".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Live dialogue sessions allowed at once
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle seconds before a session is ended and dropped
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,

    /// Seconds between idle-session sweeps
    #[serde(default = "default_session_cleanup")]
    pub session_cleanup_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_timeout() -> u64 {
    timeouts::REQUEST_SECS
}
fn default_true() -> bool {
    true
}
fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}
fn default_max_sessions() -> usize {
    sessions::MAX_SESSIONS
}
fn default_session_timeout() -> u64 {
    timeouts::SESSION_IDLE_SECS
}
fn default_session_cleanup() -> u64 {
    timeouts::SESSION_CLEANUP_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
            max_sessions: default_max_sessions(),
            session_timeout_secs: default_session_timeout(),
            session_cleanup_secs: default_session_cleanup(),
        }
    }
}

/// Index build and retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Directory of `.txt` source files
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Persisted index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Answer cap in characters
    #[serde(default = "default_max_answer_chars")]
    pub max_answer_chars: usize,

    /// Marker appended to truncated answers
    #[serde(default = "default_ellipsis")]
    pub ellipsis: String,

    /// Answer when retrieval finds nothing
    #[serde(default = "default_not_found_message")]
    pub not_found_message: String,
}

fn default_source_dir() -> String {
    rag::SOURCE_DIR.to_string()
}
fn default_index_path() -> String {
    rag::INDEX_PATH.to_string()
}
fn default_chunk_size() -> usize {
    rag::CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    rag::CHUNK_OVERLAP
}
fn default_top_k() -> usize {
    rag::TOP_K
}
fn default_max_answer_chars() -> usize {
    rag::MAX_ANSWER_CHARS
}
fn default_ellipsis() -> String {
    rag::ELLIPSIS.to_string()
}
fn default_not_found_message() -> String {
    rag::NOT_FOUND_MESSAGE.to_string()
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            index_path: default_index_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            max_answer_chars: default_max_answer_chars(),
            ellipsis: default_ellipsis(),
            not_found_message: default_not_found_message(),
        }
    }
}

/// Provider connection shared by the embedding, speech and chat clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (should be set via VOICE_AGENT__PROVIDERS__API_KEY or OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    endpoints::PROVIDER_BASE_URL.to_string()
}
fn default_embedding_model() -> String {
    rag::EMBEDDING_MODEL.to_string()
}
fn default_embedding_dimension() -> usize {
    rag::EMBEDDING_DIMENSION
}
fn default_provider_timeout() -> u64 {
    timeouts::PROVIDER_SECS
}

impl ProvidersConfig {
    /// Configured key, falling back to `OPENAI_API_KEY`
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(endpoints::API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// Recognition language hint (ISO-639-1), provider auto-detects when unset
    #[serde(default)]
    pub language: Option<String>,
}

fn default_stt_model() -> String {
    speech::STT_MODEL.to_string()
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: default_stt_model(),
            language: None,
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_tts_voice")]
    pub voice: String,
}

fn default_tts_model() -> String {
    speech::TTS_MODEL.to_string()
}
fn default_tts_voice() -> String {
    speech::TTS_VOICE.to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: default_tts_model(),
            voice: default_tts_voice(),
        }
    }
}

/// Reasoning service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Model calls per user turn while tools keep being requested
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

fn default_llm_model() -> String {
    llm::MODEL.to_string()
}
fn default_temperature() -> f32 {
    llm::TEMPERATURE
}
fn default_max_tokens() -> u32 {
    llm::MAX_TOKENS
}
fn default_max_tool_rounds() -> usize {
    llm::MAX_TOOL_ROUNDS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

/// Webhook relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Downstream server receiving `text` + `audio`
    #[serde(default = "default_llm_server_url")]
    pub llm_server_url: String,

    /// Forwarding timeout in seconds
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,

    /// Maximum words per verse
    #[serde(default = "default_max_verse_words")]
    pub max_verse_words: usize,
}

fn default_llm_server_url() -> String {
    endpoints::LLM_SERVER_URL.to_string()
}
fn default_forward_timeout() -> u64 {
    timeouts::FORWARD_SECS
}
fn default_max_verse_words() -> usize {
    speech::MAX_VERSE_WORDS
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            llm_server_url: default_llm_server_url(),
            forward_timeout_secs: default_forward_timeout(),
            max_verse_words: default_max_verse_words(),
        }
    }
}

/// Dialogue session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// System instructions for the reasoning service
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Spoken before the first model reply
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Canned weather tool result
    #[serde(default = "default_weather_response")]
    pub weather_response: String,

    /// Tool execution timeout in seconds
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

fn default_instructions() -> String {
    "คุณคือผู้ช่วยนำชมพิพิธภัณฑ์ที่พูดภาษาไทยอย่างสุภาพ ตอบสั้น กระชับ และเป็นกันเอง \
     เมื่อผู้ใช้ถามเกี่ยวกับนิทรรศการ สิ่งของจัดแสดง หรือกิจกรรมในพิพิธภัณฑ์ \
     ให้ใช้เครื่องมือ ask_about_museum เพื่อค้นหาข้อมูลก่อนตอบเสมอ"
        .to_string()
}
fn default_welcome_message() -> String {
    "สวัสดีค่ะ ยินดีต้อนรับสู่พิพิธภัณฑ์ มีอะไรให้ช่วยไหมคะ".to_string()
}
fn default_weather_response() -> String {
    "sunny with a temperature of 70 degrees.".to_string()
}
fn default_tool_timeout() -> u64 {
    timeouts::TOOL_SECS
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            welcome_message: default_welcome_message(),
            weather_response: default_weather_response(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (VOICE_AGENT__ prefix)
/// 2. config/{env}.* (if env specified)
/// 3. config/default.*
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit config directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(
        File::with_name(&dir.join("default").to_string_lossy()).required(false),
    );

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&dir.join(env_name).to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("VOICE_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}
