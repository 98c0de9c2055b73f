//! Configuration management for the voice agent
//!
//! Supports loading configuration from:
//! - `config/default.*` and `config/{env}.*` files
//! - Environment variables (`VOICE_AGENT__` prefix, `__` separator)
//!
//! All defaults live in [`constants`].

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, DialogueConfig, LlmConfig, ObservabilityConfig,
    ProvidersConfig, RagConfig, ServerConfig, Settings, SttConfig, TtsConfig, WebhookConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for voice_agent_core::Error {
    fn from(err: ConfigError) -> Self {
        voice_agent_core::Error::Configuration(err.to_string())
    }
}
