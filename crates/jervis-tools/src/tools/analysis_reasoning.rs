//! `ANALYSIS_REASONING_TOOL` — a pure LLM synthesis tool with no external
//! side effects; doubles as the registry's fallback for unresolved tool
//! names, since "reason about it in natural language" is always a safe
//! default action for a step the catalog couldn't resolve.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use jervis_core::model::{TaskContext, ToolResult};
use jervis_llm::gateway::Gateway;
use jervis_llm::prompt::{PromptType, SYNTHESIS_PROMPT};

use crate::registry::Tool;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnalysisOutput {
    answer: String,
}

/// Answers a natural-language instruction directly from the gateway, with
/// the plan's running context summary as background.
pub struct AnalysisReasoningTool {
    gateway: Arc<Gateway>,
}

impl AnalysisReasoningTool {
    /// Build the tool against a gateway.
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for AnalysisReasoningTool {
    fn name(&self) -> &str {
        "analysis_reasoning"
    }

    fn aliases(&self) -> &[&str] {
        &["analysis_reasoning_tool", "reasoning", "summarize"]
    }

    fn description(&self) -> &str {
        "Answers a question or summarizes provided text purely through LLM reasoning, \
         with no external side effects. Use when no other tool's capability fits the goal."
    }

    async fn execute(&self, instruction: &str, context: &TaskContext) -> ToolResult {
        let prompt_type = PromptType::new(SYNTHESIS_PROMPT);
        let mut mapping = HashMap::new();
        mapping.insert("instruction".to_string(), instruction.to_string());
        mapping.insert("context_summary".to_string(), context.context_summary.clone());

        let correlation_id = context.id.to_string();
        match self
            .gateway
            .call_llm::<AnalysisOutput>(&prompt_type, &mapping, context.quick, false, &correlation_id)
            .await
        {
            Ok(response) => ToolResult::success(
                self.name(),
                response.result.answer.clone(),
                serde_json::json!({ "answer": response.result.answer, "model_used": response.model_used }),
            ),
            Err(e) => ToolResult::failure(self.name(), format!("reasoning failed: {e}")),
        }
    }
}
