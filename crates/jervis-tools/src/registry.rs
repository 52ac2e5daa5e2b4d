//! Tool Registry (C11): the concrete implementation of
//! [`jervis_core::tool_registry::ToolRegistry`] — resolves a plan step's
//! `toolName` to one of this crate's tools and runs it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use jervis_core::model::{TaskContext, ToolResult};
use jervis_core::planner::ToolCatalogEntry;
use jervis_core::tool_registry::ToolRegistry as ToolRegistryContract;

/// One named capability the planner may invoke.
///
/// Mirrors the `execute(plan, taskDescription, stepContext) -> ToolResult`
/// contract: a tool parses its own natural-language `instruction` and must
/// be idempotent when invoked twice with identical parameters.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Canonical name, matched case-insensitively against a step's `toolName`.
    fn name(&self) -> &str;

    /// Alternate names the tool-reasoning phase may produce for this tool.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Description fed into the planner's tool catalog prompt.
    fn description(&self) -> &str;

    /// Run the tool against a natural-language instruction.
    async fn execute(&self, instruction: &str, context: &TaskContext) -> ToolResult;
}

/// Registry of every tool available to a `PlanExecutor`.
pub struct JervisToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    fallback_tool: String,
}

impl JervisToolRegistry {
    /// Build a registry from an explicit tool list. The first tool registers
    /// as the fallback unless overridden with [`Self::with_fallback`].
    #[must_use]
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let fallback_tool = tools.first().map(|t| t.name().to_string()).unwrap_or_default();
        let mut map = HashMap::new();
        for tool in tools {
            map.insert(tool.name().to_string(), tool);
        }
        Self { tools: map, fallback_tool }
    }

    /// Override which tool absorbs unresolved tool names.
    #[must_use]
    pub fn with_fallback(mut self, fallback_tool: impl Into<String>) -> Self {
        self.fallback_tool = fallback_tool.into();
        self
    }

    /// The default registry: every built-in tool this crate ships, with
    /// analysis-reasoning (pure LLM synthesis, no side effects) as fallback.
    #[must_use]
    pub fn with_builtins(gateway: Arc<jervis_llm::gateway::Gateway>) -> Self {
        Self::new(vec![
            Arc::new(crate::tools::RepositoryReadTool::new()),
            Arc::new(crate::tools::WebSearchTool::new()),
            Arc::new(crate::tools::AnalysisReasoningTool::new(gateway)),
        ])
        .with_fallback("analysis_reasoning")
    }
}

#[async_trait]
impl ToolRegistryContract for JervisToolRegistry {
    async fn execute(&self, tool_name: &str, instruction: &str, context: &TaskContext) -> ToolResult {
        let Some(tool) = self
            .tools
            .get(tool_name)
            .or_else(|| self.tools.get(&self.fallback_tool))
        else {
            warn!(tool_name, "no tool registered and no fallback configured");
            return ToolResult::failure(tool_name, format!("no tool registered: {tool_name}"));
        };

        let started = Instant::now();
        let result = tool.execute(instruction, context).await;
        debug!(
            tool_name = tool.name(),
            elapsed_ms = started.elapsed().as_millis(),
            success = result.success,
            "tool executed"
        );
        result
    }

    fn catalog(&self) -> Vec<ToolCatalogEntry> {
        self.tools
            .values()
            .map(|tool| ToolCatalogEntry {
                name: tool.name().to_string(),
                aliases: tool.aliases().iter().map(|a| a.to_string()).collect(),
                description: tool.description().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jervis_core::ids::ClientId;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the instruction back as the tool result"
        }

        async fn execute(&self, instruction: &str, _context: &TaskContext) -> ToolResult {
            ToolResult::success("echo", instruction, serde_json::json!({ "echoed": instruction }))
        }
    }

    #[tokio::test]
    async fn unresolved_tool_name_falls_back() {
        let registry = JervisToolRegistry::new(vec![Arc::new(EchoTool)]);
        let context = TaskContext::new(ClientId::new(), None);
        let result = registry.execute("nonexistent_tool", "hello", &context).await;
        assert!(result.success);
        assert_eq!(result.tool_name, "echo");
    }

    #[test]
    fn catalog_reflects_registered_tools() {
        let registry = JervisToolRegistry::new(vec![Arc::new(EchoTool)]);
        let catalog = registry.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "echo");
    }
}
