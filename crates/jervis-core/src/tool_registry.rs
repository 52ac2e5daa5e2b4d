//! Tool Registry contract (C11): the seam between the Plan Executor and
//! whatever crate actually implements tools (`jervis-tools`).

use async_trait::async_trait;

use crate::model::{TaskContext, ToolResult};
use crate::planner::ToolCatalogEntry;

/// Implemented by whatever owns the concrete tool catalog; the executor only
/// ever talks to tools through this trait.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Run `tool_name` with a natural-language `instruction`, scoped to
    /// `context`. Implementations should never panic on an unknown tool
    /// name — the planner already resolves names against [`Self::catalog`]
    /// before a step is created, but a registry reload between planning and
    /// execution is possible, so this still returns a failed [`ToolResult`]
    /// rather than erroring the whole plan.
    async fn execute(&self, tool_name: &str, instruction: &str, context: &TaskContext) -> ToolResult;

    /// The catalog entries the planner reasons over (C9 phase 2).
    fn catalog(&self) -> Vec<ToolCatalogEntry>;
}

/// A registry with no tools, useful for tests that only exercise scheduling.
pub struct NoopToolRegistry;

#[async_trait]
impl ToolRegistry for NoopToolRegistry {
    async fn execute(&self, tool_name: &str, _instruction: &str, _context: &TaskContext) -> ToolResult {
        ToolResult::failure(tool_name, format!("no tool registered: {tool_name}"))
    }

    fn catalog(&self) -> Vec<ToolCatalogEntry> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ClientId;

    #[tokio::test]
    async fn noop_registry_fails_every_tool() {
        let registry = NoopToolRegistry;
        let context = TaskContext::new(ClientId::new(), None);
        let result = registry.execute("anything", "do it", &context).await;
        assert!(!result.success);
    }
}
