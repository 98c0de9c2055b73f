//! Dialogue session
//!
//! One conversation with the museum guide. The session owns the chat
//! history, advertises the registry's tools to the language model and runs
//! the tool-calling loop for each user turn. Turns within a session are
//! strictly sequential.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use voice_agent_config::{DialogueConfig, LlmConfig};
use voice_agent_core::{
    GenerateRequest, GenerateResponse, LanguageModel, Message, Role, ToolCall, ToolDefinition,
};
use voice_agent_tools::ToolExecutor;

use crate::metrics::{MetricsEvent, UsageCollector, UsageSummary};
use crate::AgentError;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub instructions: String,
    pub welcome_message: String,
    /// Model calls allowed per turn; the last one is made without tools
    pub max_tool_rounds: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SessionConfig {
    pub fn from_settings(dialogue: &DialogueConfig, llm: &LlmConfig) -> Self {
        Self {
            instructions: dialogue.instructions.clone(),
            welcome_message: dialogue.welcome_message.clone(),
            max_tool_rounds: llm.max_tool_rounds,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&DialogueConfig::default(), &LlmConfig::default())
    }
}

/// Session events
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started { session_id: String },
    /// Something was said, by the user or the guide
    Utterance { role: Role, text: String },
    ToolInvoked { name: String, success: bool },
    Ended { summary: UsageSummary },
}

/// Result of [`DialogueSession::start`]
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub welcome: String,
    pub reply: String,
}

/// Museum guide dialogue session
pub struct DialogueSession {
    id: String,
    started_at: DateTime<Utc>,
    config: SessionConfig,
    llm: Arc<dyn LanguageModel>,
    tools: Arc<dyn ToolExecutor>,
    definitions: Vec<ToolDefinition>,
    history: tokio::sync::Mutex<Vec<Message>>,
    metrics_tx: Mutex<Option<mpsc::UnboundedSender<MetricsEvent>>>,
    collector: Mutex<Option<JoinHandle<UsageSummary>>>,
    event_tx: broadcast::Sender<SessionEvent>,
    last_activity: Mutex<Instant>,
}

impl DialogueSession {
    /// Create a session. Must be called inside a tokio runtime.
    pub fn new(
        config: SessionConfig,
        llm: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolExecutor>,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let (metrics_tx, metrics_rx) = mpsc::unbounded_channel();
        let collector = UsageCollector::spawn(id.clone(), metrics_rx);
        let (event_tx, _) = broadcast::channel(100);
        let definitions = tools.definitions();
        let history = vec![Message::system(config.instructions.clone())];

        Self {
            id,
            started_at: Utc::now(),
            config,
            llm,
            tools,
            definitions,
            history: tokio::sync::Mutex::new(history),
            metrics_tx: Mutex::new(Some(metrics_tx)),
            collector: Mutex::new(Some(collector)),
            event_tx,
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn is_ended(&self) -> bool {
        self.metrics_tx.lock().is_none()
    }

    /// Reset the idle timer
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the last turn started or finished
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.idle_for() > timeout
    }

    /// Snapshot of the chat history
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    /// Say the welcome message, then let the model produce its first reply
    pub async fn start(&self) -> Result<StartOutcome, AgentError> {
        let mut history = self.history.lock().await;
        self.ensure_open()?;
        self.touch();
        tracing::info!(session_id = %self.id, "Dialogue session started");
        self.emit(SessionEvent::Started {
            session_id: self.id.clone(),
        });

        let welcome = self.config.welcome_message.clone();
        history.push(Message::assistant(welcome.clone()));
        self.emit(SessionEvent::Utterance {
            role: Role::Assistant,
            text: welcome.clone(),
        });

        let reply = self.run_turn(&mut history).await;
        self.touch();
        Ok(StartOutcome {
            welcome,
            reply: reply?,
        })
    }

    /// Run one user turn and return the guide's reply
    ///
    /// Turns queue on the history lock; one that gets the lock after
    /// [`end`](Self::end) fails with `SessionEnded`.
    pub async fn respond(&self, user_text: &str) -> Result<String, AgentError> {
        let mut history = self.history.lock().await;
        self.ensure_open()?;
        self.touch();
        history.push(Message::user(user_text));
        self.emit(SessionEvent::Utterance {
            role: Role::User,
            text: user_text.to_string(),
        });

        let reply = self.run_turn(&mut history).await;
        self.touch();
        reply
    }

    /// Close the metrics channel and return the usage summary
    ///
    /// Waits for an in-flight turn, so its usage is part of the summary.
    pub async fn end(&self) -> Result<UsageSummary, AgentError> {
        let _history = self.history.lock().await;
        let sender = self.metrics_tx.lock().take();
        if sender.is_none() {
            return Err(AgentError::SessionEnded);
        }
        drop(sender);

        let handle = self.collector.lock().take();
        let summary = match handle {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                tracing::warn!(session_id = %self.id, error = %e, "Usage collector failed");
                UsageSummary::default()
            }),
            None => UsageSummary::default(),
        };

        tracing::info!(session_id = %self.id, "Usage: {}", summary);
        self.emit(SessionEvent::Ended { summary });
        Ok(summary)
    }

    fn ensure_open(&self) -> Result<(), AgentError> {
        if self.is_ended() {
            Err(AgentError::SessionEnded)
        } else {
            Ok(())
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn record(&self, event: MetricsEvent) {
        if let Some(tx) = self.metrics_tx.lock().as_ref() {
            let _ = tx.send(event);
        }
    }

    async fn run_turn(&self, history: &mut Vec<Message>) -> Result<String, AgentError> {
        let max_rounds = self.config.max_tool_rounds.max(1);

        for round in 0..max_rounds {
            let tools_allowed = round + 1 < max_rounds && !self.definitions.is_empty();
            let response = self.call_model(history, tools_allowed).await?;

            if !tools_allowed || !response.has_tool_calls() {
                if response.has_tool_calls() {
                    tracing::warn!(
                        session_id = %self.id,
                        ignored = response.tool_calls.len(),
                        "Tool calls requested past the round limit"
                    );
                }
                let reply = response.text;
                history.push(Message::assistant(reply.clone()));
                self.emit(SessionEvent::Utterance {
                    role: Role::Assistant,
                    text: reply.clone(),
                });
                return Ok(reply);
            }

            history.push(Message::assistant_tool_calls(
                response.text,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let result = self.invoke_tool(call).await;
                history.push(Message::tool(result, call.id.clone()));
            }
        }

        // max_rounds >= 1 and the last round always returns
        Ok(String::new())
    }

    async fn call_model(
        &self,
        history: &[Message],
        with_tools: bool,
    ) -> Result<GenerateResponse, AgentError> {
        let request = GenerateRequest::from_messages(history.to_vec())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let started = Instant::now();
        let response = if with_tools {
            self.llm.generate_with_tools(request, &self.definitions).await?
        } else {
            self.llm.generate(request).await?
        };

        let usage = response.usage.unwrap_or_default();
        self.record(MetricsEvent::LlmUsage {
            model: self.llm.model_name().to_string(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            duration_ms: started.elapsed().as_millis() as u64,
        });

        Ok(response)
    }

    /// Execute one tool call; failures become the tool's result text
    async fn invoke_tool(&self, call: &ToolCall) -> String {
        let started = Instant::now();
        let result = self.tools.execute(&call.name, call.arguments_value()).await;
        let success = result.is_ok();

        self.record(MetricsEvent::ToolCall {
            name: call.name.clone(),
            success,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        self.emit(SessionEvent::ToolInvoked {
            name: call.name.clone(),
            success,
        });

        match result {
            Ok(output) => output.to_text(),
            Err(e) => {
                tracing::warn!(session_id = %self.id, tool = %call.name, error = %e, "Tool call failed");
                format!("Error: {}", e)
            }
        }
    }
}
