//! Usage metrics
//!
//! The session pushes a [`MetricsEvent`] for every model call and tool
//! call onto an unbounded channel; a collector task logs each record and
//! folds it into a [`UsageSummary`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One usage record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricsEvent {
    LlmUsage {
        model: String,
        prompt_tokens: u32,
        completion_tokens: u32,
        duration_ms: u64,
    },
    ToolCall {
        name: String,
        success: bool,
        duration_ms: u64,
    },
}

/// Aggregated usage for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub llm_calls: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub tool_calls: u32,
    pub tool_failures: u32,
    /// Time spent waiting on the model
    pub llm_time_ms: u64,
}

impl UsageSummary {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

impl fmt::Display for UsageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "llm_calls={} prompt_tokens={} completion_tokens={} total_tokens={} tool_calls={} tool_failures={} llm_time_ms={}",
            self.llm_calls,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens(),
            self.tool_calls,
            self.tool_failures,
            self.llm_time_ms
        )
    }
}

/// Folds metrics events into a summary
#[derive(Debug, Default)]
pub struct UsageCollector {
    summary: UsageSummary,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, event: &MetricsEvent) {
        match event {
            MetricsEvent::LlmUsage {
                prompt_tokens,
                completion_tokens,
                duration_ms,
                ..
            } => {
                self.summary.llm_calls += 1;
                self.summary.prompt_tokens += u64::from(*prompt_tokens);
                self.summary.completion_tokens += u64::from(*completion_tokens);
                self.summary.llm_time_ms += duration_ms;
            }
            MetricsEvent::ToolCall { success, .. } => {
                self.summary.tool_calls += 1;
                if !success {
                    self.summary.tool_failures += 1;
                }
            }
        }
    }

    pub fn summary(&self) -> UsageSummary {
        self.summary
    }

    /// Drain `rx` on a background task until every sender is dropped
    pub fn spawn(
        session_id: String,
        mut rx: mpsc::UnboundedReceiver<MetricsEvent>,
    ) -> JoinHandle<UsageSummary> {
        tokio::spawn(async move {
            let mut collector = UsageCollector::new();
            while let Some(event) = rx.recv().await {
                tracing::debug!(session_id = %session_id, ?event, "Metrics collected");
                collector.collect(&event);
            }
            collector.summary()
        })
    }
}
