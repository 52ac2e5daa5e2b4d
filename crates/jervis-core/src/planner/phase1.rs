//! Phase 1 — Planner: englishQuestion + contextSummary + tool catalog
//! descriptions go to the LLM Gateway under a planning-style prompt type,
//! and come back as a set of goals with their dependencies.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use jervis_llm::gateway::Gateway;
use jervis_llm::prompt::PromptType;

use crate::error::{Error, Result};
use crate::planner::goals::{topological_sort, GoalsDto};

/// Prompt type the gateway resolves for phase 1 planning calls.
pub const PLANNING_PROMPT: &str = "PLANNING";

/// Raw schema the planner's LLM call is validated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerOutput {
    /// Goals the planner decomposed the task into, with their dependencies
    pub goals: Vec<GoalsDto>,
}

/// Run phase 1: ask the gateway for goals, re-prompting once with the
/// validator's message if the result has a cycle or a missing dependency,
/// then return them in dependency order.
pub async fn plan_goals(
    gateway: &Arc<Gateway>,
    english_question: &str,
    context_summary: &str,
    tool_catalog_descriptions: &str,
    quick: bool,
    correlation_id: &str,
) -> Result<Vec<GoalsDto>> {
    let prompt_type = PromptType::new(PLANNING_PROMPT);
    let mut mapping = base_mapping(english_question, context_summary, tool_catalog_descriptions);

    let first = gateway
        .call_llm::<PlannerOutput>(&prompt_type, &mapping, quick, false, correlation_id)
        .await?;

    match topological_sort(&first.result.goals) {
        Ok(sorted) => Ok(sorted),
        Err(err) if err.is_planner_revalidation() => {
            mapping.insert("validation_error".to_string(), err.to_string());
            let retried = gateway
                .call_llm::<PlannerOutput>(&prompt_type, &mapping, quick, false, correlation_id)
                .await?;
            topological_sort(&retried.result.goals)
        }
        Err(err) => Err(err),
    }
}

fn base_mapping(
    english_question: &str,
    context_summary: &str,
    tool_catalog_descriptions: &str,
) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    mapping.insert("english_question".to_string(), english_question.to_string());
    mapping.insert("context_summary".to_string(), context_summary.to_string());
    mapping.insert(
        "tool_catalog".to_string(),
        tool_catalog_descriptions.to_string(),
    );
    mapping.insert("validation_error".to_string(), String::new());
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_mapping_includes_all_placeholders() {
        let mapping = base_mapping("what is X?", "summary so far", "tool: search");
        assert_eq!(mapping["english_question"], "what is X?");
        assert_eq!(mapping["context_summary"], "summary so far");
        assert_eq!(mapping["tool_catalog"], "tool: search");
        assert_eq!(mapping["validation_error"], "");
    }
}
