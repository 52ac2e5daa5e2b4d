use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContextId, PlanId, StepId};
use crate::model::ToolResult;

/// Lifecycle status of a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// No step has started
    Created,
    /// At least one step has entered Running or Done
    Running,
    /// Every step is Done, finalizer not yet run
    Completed,
    /// Finalizer has produced `final_answer`
    Finalized,
    /// A step's failure could not be recovered
    Failed,
}

/// Lifecycle status of a [`PlanStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet started
    Pending,
    /// Currently executing
    Running,
    /// Completed successfully
    Done,
    /// Failed; see the plan's recovery policy
    Failed,
}

/// One node of a plan's DAG, bound to exactly one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Opaque id
    pub id: StepId,
    /// Position within the plan; unique within a plan
    pub order: u32,
    /// Owning plan
    pub plan_id: PlanId,
    /// Owning context
    pub context_id: ContextId,
    /// Tool this step invokes
    pub tool_name: String,
    /// Natural-language instruction passed to the tool
    pub step_instruction: String,
    /// Orders of steps this one depends on; all must be strictly lower
    pub depends_on: Vec<u32>,
    /// Optional grouping label for steps produced by the same planning round
    pub step_group: Option<String>,
    /// Current status
    pub status: StepStatus,
    /// Result, once the step has run
    pub tool_result: Option<ToolResult>,
}

impl PlanStep {
    /// Whether every dependency of this step is satisfied by `done_orders`.
    #[must_use]
    pub fn is_ready(&self, done_orders: &[u32]) -> bool {
        self.status == StepStatus::Pending
            && self.depends_on.iter().all(|dep| done_orders.contains(dep))
    }
}

/// A DAG of tool invocations produced to satisfy a user task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Opaque id
    pub id: PlanId,
    /// Owning context
    pub context_id: ContextId,
    /// The user's original, unedited question
    pub original_question: String,
    /// The question translated/normalized to English for planning prompts
    pub english_question: String,
    /// Lifecycle status
    pub status: PlanStatus,
    /// Ordered steps; `order` is the source of truth for ordering, not index
    pub steps: Vec<PlanStep>,
    /// Running summary of context accumulated across steps
    pub context_summary: Option<String>,
    /// User-visible answer, set once Finalized
    pub final_answer: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Start a new, empty plan in `Created` status.
    #[must_use]
    pub fn new(
        context_id: ContextId,
        original_question: impl Into<String>,
        english_question: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PlanId::new(),
            context_id,
            original_question: original_question.into(),
            english_question: english_question.into(),
            status: PlanStatus::Created,
            steps: Vec::new(),
            context_summary: None,
            final_answer: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The set of step orders currently `Done`.
    #[must_use]
    pub fn done_orders(&self) -> Vec<u32> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Done)
            .map(|s| s.order)
            .collect()
    }

    /// The ready set: steps whose dependencies are all `Done`.
    #[must_use]
    pub fn ready_steps(&self) -> Vec<&PlanStep> {
        let done = self.done_orders();
        self.steps.iter().filter(|s| s.is_ready(&done)).collect()
    }

    /// Whether every step has reached `Done`.
    #[must_use]
    pub fn all_done(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status == StepStatus::Done)
    }

    /// Append new steps at the end, numbering them `max(order) + i + 1`.
    /// Returns a new plan with recomputed order and a bumped `updated_at`.
    #[must_use]
    pub fn append_steps(&self, new_steps: Vec<NewStep>) -> Plan {
        let mut plan = self.clone();
        let base = plan.steps.iter().map(|s| s.order).max().unwrap_or(0);
        for (i, new_step) in new_steps.into_iter().enumerate() {
            plan.steps.push(new_step.into_step(
                base + i as u32 + 1,
                plan.id,
                plan.context_id,
            ));
        }
        plan.updated_at = Utc::now();
        plan
    }

    /// Prepend new steps at the front, re-numbering existing steps by adding
    /// the inserted count to each of their orders (and to every `depends_on`
    /// reference, so the DAG shape is preserved).
    #[must_use]
    pub fn prepend_steps(&self, new_steps: Vec<NewStep>) -> Plan {
        let mut plan = self.clone();
        let inserted = new_steps.len() as u32;

        for step in &mut plan.steps {
            step.order += inserted;
            for dep in &mut step.depends_on {
                *dep += inserted;
            }
        }

        let mut prepended: Vec<PlanStep> = new_steps
            .into_iter()
            .enumerate()
            .map(|(i, new_step)| new_step.into_step(i as u32 + 1, plan.id, plan.context_id))
            .collect();
        prepended.append(&mut plan.steps);
        plan.steps = prepended;
        plan.updated_at = Utc::now();
        plan
    }

    /// Insert a single new step immediately before the step currently at
    /// `at_order`, re-numbering that step and everything after it (and their
    /// `depends_on` references) by one.
    #[must_use]
    pub fn insert_step_before(&self, at_order: u32, new_step: NewStep) -> Plan {
        let mut plan = self.clone();
        for step in &mut plan.steps {
            if step.order >= at_order {
                step.order += 1;
            }
            for dep in &mut step.depends_on {
                if *dep >= at_order {
                    *dep += 1;
                }
            }
        }
        plan.steps
            .push(new_step.into_step(at_order, plan.id, plan.context_id));
        plan.steps.sort_by_key(|s| s.order);
        plan.updated_at = Utc::now();
        plan
    }

    /// Replace the step at `at_order` with its recovery-reasoning
    /// replacement, retiring the original rather than leaving it behind in a
    /// terminal `Failed` state. The replacement keeps the exact same
    /// `order`, so anything that already depended on the failed step keeps
    /// depending on that order slot — now satisfied once the replacement
    /// runs — without renumbering the rest of the plan. Used by the
    /// executor's recovery policy.
    #[must_use]
    pub fn supersede_step(&self, at_order: u32, new_step: NewStep) -> Plan {
        let mut plan = self.clone();
        plan.steps.retain(|s| s.order != at_order);
        plan.steps
            .push(new_step.into_step(at_order, plan.id, plan.context_id));
        plan.steps.sort_by_key(|s| s.order);
        plan.updated_at = Utc::now();
        plan
    }

    /// Append a single new step; convenience wrapper over [`Self::append_steps`].
    #[must_use]
    pub fn append_new_step(&self, new_step: NewStep) -> Plan {
        self.append_steps(vec![new_step])
    }

    /// Prepend a single new step; convenience wrapper over [`Self::prepend_steps`].
    #[must_use]
    pub fn prepend_new_step(&self, new_step: NewStep) -> Plan {
        self.prepend_steps(vec![new_step])
    }

    /// Transition a step by order to a new status, bumping `updated_at`.
    pub fn set_step_status(&mut self, order: u32, status: StepStatus, result: Option<ToolResult>) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.order == order) {
            step.status = status;
            if result.is_some() {
                step.tool_result = result;
            }
        }
        self.updated_at = Utc::now();
        if self.status == PlanStatus::Created {
            self.status = PlanStatus::Running;
        }
    }
}

/// A step not yet assigned an order, id or plan/context binding — the shape
/// the planner and recovery policy build before handing off to
/// [`Plan::append_steps`]/[`Plan::prepend_steps`].
#[derive(Debug, Clone)]
pub struct NewStep {
    /// Tool this step invokes
    pub tool_name: String,
    /// Rendered instruction
    pub step_instruction: String,
    /// Orders of steps this one depends on
    pub depends_on: Vec<u32>,
    /// Optional grouping label
    pub step_group: Option<String>,
}

impl NewStep {
    fn into_step(self, order: u32, plan_id: PlanId, context_id: ContextId) -> PlanStep {
        PlanStep {
            id: StepId::new(),
            order,
            plan_id,
            context_id,
            tool_name: self.tool_name,
            step_instruction: self.step_instruction,
            depends_on: self.depends_on,
            step_group: self.step_group,
            status: StepStatus::Pending,
            tool_result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_step(name: &str, depends_on: Vec<u32>) -> NewStep {
        NewStep {
            tool_name: name.to_string(),
            step_instruction: format!("do {name}"),
            depends_on,
            step_group: None,
        }
    }

    #[test]
    fn append_steps_numbers_from_max_plus_one() {
        let plan = Plan::new(ContextId::new(), "q", "q");
        let plan = plan.append_steps(vec![new_step("a", vec![]), new_step("b", vec![1])]);
        assert_eq!(plan.steps.iter().map(|s| s.order).collect::<Vec<_>>(), vec![1, 2]);

        let plan = plan.append_new_step(new_step("c", vec![2]));
        assert_eq!(plan.steps.last().unwrap().order, 3);
    }

    #[test]
    fn prepend_steps_renumbers_existing_and_their_dependencies() {
        let plan = Plan::new(ContextId::new(), "q", "q");
        let plan = plan.append_steps(vec![new_step("a", vec![]), new_step("b", vec![1])]);
        let plan = plan.prepend_steps(vec![new_step("recovery", vec![])]);

        let orders: Vec<u32> = plan.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        // "b" (now order 3) still depends on "a" (now order 2), not the old order 1.
        let b = plan.steps.iter().find(|s| s.tool_name == "b").unwrap();
        assert_eq!(b.depends_on, vec![2]);
    }

    #[test]
    fn insert_step_before_renumbers_the_tail_and_its_dependencies() {
        let plan = Plan::new(ContextId::new(), "q", "q");
        let plan = plan.append_steps(vec![
            new_step("a", vec![]),
            new_step("b", vec![1]),
            new_step("c", vec![2]),
        ]);
        let plan = plan.insert_step_before(2, new_step("recovery", vec![1]));

        let orders: Vec<(String, u32, Vec<u32>)> = plan
            .steps
            .iter()
            .map(|s| (s.tool_name.clone(), s.order, s.depends_on.clone()))
            .collect();
        assert_eq!(
            orders,
            vec![
                ("a".to_string(), 1, vec![]),
                ("recovery".to_string(), 2, vec![1]),
                ("b".to_string(), 3, vec![1]),
                ("c".to_string(), 4, vec![3]),
            ]
        );
    }

    #[test]
    fn supersede_step_replaces_the_failed_step_in_its_own_order_slot() {
        let plan = Plan::new(ContextId::new(), "q", "q");
        let mut plan = plan.append_steps(vec![
            new_step("a", vec![]),
            new_step("b", vec![1]),
            new_step("c", vec![2]),
        ]);
        plan.set_step_status(2, StepStatus::Failed, None);

        let plan = plan.supersede_step(2, new_step("recovery", vec![1]));

        let orders: Vec<(String, u32, Vec<u32>)> = plan
            .steps
            .iter()
            .map(|s| (s.tool_name.clone(), s.order, s.depends_on.clone()))
            .collect();
        assert_eq!(
            orders,
            vec![
                ("a".to_string(), 1, vec![]),
                ("recovery".to_string(), 2, vec![1]),
                ("c".to_string(), 3, vec![2]),
            ]
        );
        // "c" still depends on order 2, now satisfied by "recovery" rather
        // than by the failed step it replaced, and nothing is left behind in
        // a permanently Failed state.
        assert!(plan.steps.iter().all(|s| s.status != StepStatus::Failed));
    }

    #[test]
    fn ready_steps_respect_dependencies() {
        let plan = Plan::new(ContextId::new(), "q", "q");
        let mut plan = plan.append_steps(vec![new_step("a", vec![]), new_step("b", vec![1])]);
        assert_eq!(plan.ready_steps().len(), 1);
        assert_eq!(plan.ready_steps()[0].tool_name, "a");

        plan.set_step_status(1, StepStatus::Done, None);
        assert_eq!(plan.ready_steps().len(), 1);
        assert_eq!(plan.ready_steps()[0].tool_name, "b");
    }

    #[test]
    fn all_done_requires_non_empty_and_every_step_done() {
        let plan = Plan::new(ContextId::new(), "q", "q");
        assert!(!plan.all_done());
        let mut plan = plan.append_new_step(new_step("a", vec![]));
        assert!(!plan.all_done());
        plan.set_step_status(1, StepStatus::Done, None);
        assert!(plan.all_done());
    }
}
