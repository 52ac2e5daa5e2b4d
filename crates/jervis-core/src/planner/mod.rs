//! Two-phase Planner (C9): phase 1 decomposes a task into dependency-ordered
//! goals, phase 2 resolves each goal to a concrete tool invocation.

mod catalog;
mod goals;
mod phase1;
mod phase2;

use std::collections::HashMap;
use std::sync::Arc;

use jervis_llm::gateway::Gateway;

pub use catalog::{ToolCatalog, ToolCatalogEntry};
pub use goals::{independent_groups, topological_sort, GoalsDto};
pub use phase1::{plan_goals, PlannerOutput, PLANNING_PROMPT};
pub use phase2::{reason_about_tool, ToolSelection, TOOL_REASONING_PROMPT};

use crate::error::Result;
use crate::model::{Plan, TaskContext};

/// Drives both planning phases to build a full [`Plan`] for a task.
pub struct Planner {
    gateway: Arc<Gateway>,
    catalog: ToolCatalog,
}

impl Planner {
    /// Build a planner against a gateway and the tool catalog it should
    /// reason over.
    #[must_use]
    pub fn new(gateway: Arc<Gateway>, catalog: ToolCatalog) -> Self {
        Self { gateway, catalog }
    }

    /// Run phase 1 then phase 2 for every goal, producing a fully-populated
    /// plan. Goals are resolved to steps in dependency order so that each
    /// step's `depends_on` can reference the order already assigned to its
    /// dependencies.
    pub async fn plan_task(
        &self,
        task_context: &TaskContext,
        original_question: impl Into<String>,
        english_question: impl Into<String>,
        correlation_id: &str,
    ) -> Result<Plan> {
        let original_question = original_question.into();
        let english_question = english_question.into();

        let goals = plan_goals(
            &self.gateway,
            &english_question,
            &task_context.context_summary,
            &self.catalog.describe(),
            task_context.quick,
            correlation_id,
        )
        .await?;

        let mut plan = Plan::new(
            task_context.id,
            original_question,
            english_question,
        );
        let mut goal_order: HashMap<u32, u32> = HashMap::new();

        for goal in &goals {
            let new_step = reason_about_tool(
                &self.gateway,
                goal,
                &self.catalog,
                &task_context.context_summary,
                &goal_order,
                task_context.quick,
                correlation_id,
            )
            .await?;

            plan = plan.append_new_step(new_step);
            let assigned_order = plan
                .steps
                .last()
                .expect("just appended a step")
                .order;
            goal_order.insert(goal.goal_id, assigned_order);
        }

        Ok(plan)
    }
}
