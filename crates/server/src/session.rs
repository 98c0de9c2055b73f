//! Session Management
//!
//! Live dialogue sessions keyed by id, with idle expiry.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use voice_agent_agent::{DialogueSession, SessionConfig};
use voice_agent_config::constants::timeouts;
use voice_agent_core::LanguageModel;
use voice_agent_tools::ToolExecutor;

use crate::ServerError;

/// Session manager
pub struct SessionManager {
    sessions: DashMap<String, Arc<DialogueSession>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(
            max_sessions,
            Duration::from_secs(timeouts::SESSION_IDLE_SECS),
            Duration::from_secs(timeouts::SESSION_CLEANUP_SECS),
        )
    }

    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    pub fn from_settings(config: &voice_agent_config::ServerConfig) -> Self {
        Self::with_config(
            config.max_sessions,
            Duration::from_secs(config.session_timeout_secs),
            Duration::from_secs(config.session_cleanup_secs),
        )
    }

    /// Create and register a session
    ///
    /// At the cap, expired sessions are swept first; if none were idle the
    /// request is refused with `Capacity`.
    pub fn create(
        &self,
        config: SessionConfig,
        llm: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolExecutor>,
    ) -> Result<Arc<DialogueSession>, ServerError> {
        if self.sessions.len() >= self.max_sessions {
            self.cleanup_expired();
            if self.sessions.len() >= self.max_sessions {
                return Err(ServerError::Capacity(format!(
                    "Max sessions reached ({})",
                    self.max_sessions
                )));
            }
        }

        let session = Arc::new(DialogueSession::new(config, llm, tools));
        self.sessions
            .insert(session.id().to_string(), session.clone());

        tracing::info!(session_id = %session.id(), "Created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<DialogueSession>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Unregister a session; the caller ends it
    pub fn remove(&self, id: &str) -> Option<Arc<DialogueSession>> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drop sessions idle past the timeout and end them in the background
    ///
    /// Returns how many were removed. Must be called inside a tokio runtime.
    pub fn cleanup_expired(&self) -> usize {
        let timeout = self.session_timeout;
        let mut expired = Vec::new();
        self.sessions.retain(|_, session| {
            if session.is_expired(timeout) {
                expired.push(session.clone());
                false
            } else {
                true
            }
        });

        for session in &expired {
            tracing::info!(
                session_id = %session.id(),
                idle_secs = session.idle_for().as_secs(),
                "Session expired"
            );
            let session = session.clone();
            tokio::spawn(async move {
                // logs the usage summary
                let _ = session.end().await;
            });
        }

        expired.len()
    }

    /// Periodically sweep idle sessions until the returned sender fires
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = self.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                "Session cleanup: removed {} expired sessions ({} remaining)",
                                removed,
                                manager.count()
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("Session cleanup task stopped");
                        break;
                    }
                }
            }
        });

        tracing::info!(
            interval_secs = interval.as_secs(),
            timeout_secs = self.session_timeout.as_secs(),
            "Started session cleanup task"
        );
        shutdown_tx
    }
}
