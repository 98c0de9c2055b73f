//! Museum question-answering tool
//!
//! Thin wrapper around [`DocumentRetriever::answer`]. An empty search
//! result is a normal answer (the not-found message), never an error.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use voice_agent_rag::DocumentRetriever;

use crate::tool::{required_str, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

pub const MUSEUM_QA_TOOL: &str = "ask_about_museum";

const DESCRIPTION: &str =
    "ค้นหาคำตอบจากข้อมูลในพิพิธภัณฑ์ เช่น นิทรรศการหรือสิ่งของจัดแสดง";

pub struct MuseumQaTool {
    retriever: Arc<DocumentRetriever>,
}

impl MuseumQaTool {
    pub fn new(retriever: Arc<DocumentRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for MuseumQaTool {
    fn name(&self) -> &str {
        MUSEUM_QA_TOOL
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            MUSEUM_QA_TOOL,
            DESCRIPTION,
            InputSchema::object().property(
                "question",
                PropertySchema::string("Question about the museum, its exhibitions or objects"),
                true,
            ),
        )
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let question = required_str(&input, "question")?;
        tracing::info!(question, "Answering museum question");

        let answer = self
            .retriever
            .answer(question)
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?;

        Ok(ToolOutput::text(answer))
    }
}
