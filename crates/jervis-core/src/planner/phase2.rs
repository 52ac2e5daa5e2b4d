//! Phase 2 — Tool Reasoning: turn one goal into a concrete [`NewStep`] by
//! asking the LLM Gateway which tool to invoke and how.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use jervis_llm::gateway::Gateway;
use jervis_llm::prompt::PromptType;

use crate::error::Result;
use crate::model::NewStep;
use crate::planner::catalog::ToolCatalog;
use crate::planner::goals::GoalsDto;

/// Prompt type the gateway resolves for phase 2 tool-reasoning calls.
pub const TOOL_REASONING_PROMPT: &str = "TOOL_REASONING";

/// Raw schema the tool-reasoning LLM call is validated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSelection {
    /// Tool name as produced by the model, resolved against the catalog
    pub tool_name: String,
    /// Why this tool was chosen, carried into the step for observability
    pub reasoning: String,
    /// Natural-language instruction/parameters passed to the tool
    pub parameters: String,
}

/// Ask the gateway which tool satisfies `goal`, resolve its name against
/// `catalog`, and translate `goal.depends_on` (goal ids) to step orders via
/// `goal_order`, the mapping built up as earlier goals are turned into steps.
pub async fn reason_about_tool(
    gateway: &Arc<Gateway>,
    goal: &GoalsDto,
    catalog: &ToolCatalog,
    context_summary: &str,
    goal_order: &HashMap<u32, u32>,
    quick: bool,
    correlation_id: &str,
) -> Result<NewStep> {
    let prompt_type = PromptType::new(TOOL_REASONING_PROMPT);
    let mut mapping = HashMap::new();
    mapping.insert("goal_intent".to_string(), goal.goal_intent.clone());
    mapping.insert("context_summary".to_string(), context_summary.to_string());
    mapping.insert("tool_catalog".to_string(), catalog.describe());

    let response = gateway
        .call_llm::<ToolSelection>(&prompt_type, &mapping, quick, false, correlation_id)
        .await?;
    let selection = response.result;

    let depends_on = goal
        .depends_on
        .iter()
        .filter_map(|goal_id| goal_order.get(goal_id).copied())
        .collect();

    Ok(NewStep {
        tool_name: catalog.resolve(&selection.tool_name),
        step_instruction: selection.parameters,
        depends_on,
        step_group: Some(format!("goal-{}", goal.goal_id)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::catalog::ToolCatalogEntry;

    #[test]
    fn goal_dependencies_translate_through_goal_order_map() {
        let mut goal_order = HashMap::new();
        goal_order.insert(1u32, 3u32);
        goal_order.insert(2u32, 4u32);

        let goal = GoalsDto {
            goal_id: 3,
            goal_intent: "summarize".to_string(),
            depends_on: vec![1, 2],
        };

        let depends_on: Vec<u32> = goal
            .depends_on
            .iter()
            .filter_map(|goal_id| goal_order.get(goal_id).copied())
            .collect();
        assert_eq!(depends_on, vec![3, 4]);
    }

    #[test]
    fn catalog_resolution_is_reused_for_step_tool_name() {
        let catalog = ToolCatalog::new(
            vec![ToolCatalogEntry {
                name: "search_wiki".to_string(),
                aliases: vec!["wiki_search".to_string()],
                description: "Search the wiki".to_string(),
            }],
            "reason",
        );
        assert_eq!(catalog.resolve("WIKI_SEARCH"), "search_wiki");
    }
}
