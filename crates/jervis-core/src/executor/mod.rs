//! Plan Executor (C10): drives a [`Plan`] to completion — ready-set
//! scheduling under a parallelism cap, step-failure recovery, and a
//! finalizer that synthesizes the user-facing answer.

mod config;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use jervis_llm::gateway::Gateway;
use jervis_llm::prompt::{PromptType, RECOVERY_REASONING_PROMPT};

pub use config::{ExecutorConfig, FINALIZER_PROMPT};

use crate::error::{Error, Result};
use crate::event_bus::{EventBus, JervisEvent};
use crate::model::{NewStep, Plan, PlanStatus, StepStatus, TaskContext};
use crate::tool_registry::ToolRegistry;

/// Schema the finalizer's LLM call is validated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FinalizerOutput {
    final_answer: String,
}

/// Drives plan execution; holds no per-plan state so one executor instance
/// can run many plans concurrently.
pub struct PlanExecutor {
    gateway: Arc<Gateway>,
    tools: Arc<dyn ToolRegistry>,
    events: Arc<EventBus>,
    config: ExecutorConfig,
}

impl PlanExecutor {
    /// Build an executor from its collaborators.
    #[must_use]
    pub fn new(
        gateway: Arc<Gateway>,
        tools: Arc<dyn ToolRegistry>,
        events: Arc<EventBus>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            gateway,
            tools,
            events,
            config,
        }
    }

    /// Run `plan` to completion: schedule ready steps under the parallelism
    /// cap until every step is done or the plan fails, then finalize.
    pub async fn execute_plan(
        &self,
        mut plan: Plan,
        task_context: &TaskContext,
        correlation_id: &str,
    ) -> Result<Plan> {
        let mut consecutive_recoveries: HashMap<u32, u32> = HashMap::new();

        while !plan.all_done() {
            let ready: Vec<u32> = plan.ready_steps().iter().map(|s| s.order).collect();
            if ready.is_empty() {
                // Nothing ready and not all done: every remaining step is
                // blocked on a dependency that will never complete.
                return Err(Error::StateConflict(
                    "no ready steps but plan is not complete".to_string(),
                ));
            }

            let semaphore = Arc::new(Semaphore::new(self.config.max_parallelism));
            let mut outcomes = Vec::with_capacity(ready.len());
            let mut handles = Vec::with_capacity(ready.len());

            for order in ready {
                let step = plan
                    .steps
                    .iter()
                    .find(|s| s.order == order)
                    .expect("order came from this plan's ready_steps")
                    .clone();
                let semaphore = semaphore.clone();
                let tools = self.tools.clone();
                let task_context = task_context.clone();

                handles.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                    let start = std::time::Instant::now();
                    let result = tools
                        .execute(&step.tool_name, &step.step_instruction, &task_context)
                        .await;
                    (order, step.tool_name, result, start.elapsed())
                }));
            }

            for handle in handles {
                outcomes.push(handle.await.map_err(|e| Error::Internal(e.to_string()))?);
            }

            for (order, tool_name, result, elapsed) in outcomes {
                let success = result.success;
                plan.set_step_status(
                    order,
                    if success { StepStatus::Done } else { StepStatus::Failed },
                    Some(result),
                );
                self.events.publish(JervisEvent::StepCompletionEvent {
                    plan_id: plan.id,
                    step_order: order,
                    tool_name,
                    success,
                    duration_ms: elapsed.as_millis() as u64,
                });

                if !success {
                    plan = self
                        .recover_step(plan, order, task_context, &mut consecutive_recoveries, correlation_id)
                        .await?;
                    if plan.status == PlanStatus::Failed {
                        return Ok(plan);
                    }
                }
            }
        }

        let from = plan.status;
        plan.status = PlanStatus::Completed;
        self.events.publish(JervisEvent::PlanStatusChangeEvent {
            plan_id: plan.id,
            from,
            to: plan.status,
        });

        self.finalize(plan, task_context, correlation_id).await
    }

    /// Supersede the failed step at `failed_order` with a `RECOVERY_REASONING`
    /// replacement that takes over its order slot and dependencies. After
    /// `max_recovery_attempts` consecutive recoveries for the same step, the
    /// plan is marked `Failed` instead.
    async fn recover_step(
        &self,
        plan: Plan,
        failed_order: u32,
        task_context: &TaskContext,
        consecutive_recoveries: &mut HashMap<u32, u32>,
        correlation_id: &str,
    ) -> Result<Plan> {
        let attempts = consecutive_recoveries.entry(failed_order).or_insert(0);
        *attempts += 1;

        if *attempts > self.config.max_recovery_attempts {
            let mut plan = plan;
            let from = plan.status;
            plan.status = PlanStatus::Failed;
            warn!(
                plan_id = %plan.id,
                failed_order,
                attempts,
                "step exceeded recovery attempts, failing plan"
            );
            self.events.publish(JervisEvent::PlanStatusChangeEvent {
                plan_id: plan.id,
                from,
                to: plan.status,
            });
            return Ok(plan);
        }

        let failed_step = plan
            .steps
            .iter()
            .find(|s| s.order == failed_order)
            .expect("failed_order came from this plan");
        let error_message = failed_step
            .tool_result
            .as_ref()
            .and_then(|r| r.error_message.clone())
            .unwrap_or_else(|| "tool execution failed".to_string());

        info!(
            plan_id = %plan.id,
            failed_order,
            attempt = *attempts,
            "superseding failed step with recovery reasoning step"
        );

        let mut mapping = HashMap::new();
        mapping.insert("failed_tool".to_string(), failed_step.tool_name.clone());
        mapping.insert("error_message".to_string(), error_message);
        mapping.insert(
            "step_instruction".to_string(),
            failed_step.step_instruction.clone(),
        );

        let prompt_type = PromptType::new(RECOVERY_REASONING_PROMPT);
        let response = self
            .gateway
            .call_llm::<crate::planner::ToolSelection>(
                &prompt_type,
                &mapping,
                task_context.quick,
                false,
                correlation_id,
            )
            .await?;

        let recovery_step = NewStep {
            tool_name: response.result.tool_name,
            step_instruction: response.result.parameters,
            depends_on: failed_step.depends_on.clone(),
            step_group: Some("recovery".to_string()),
        };

        Ok(plan.supersede_step(failed_order, recovery_step))
    }

    /// Invoke the gateway's `FINALIZER` prompt to synthesize the user-facing
    /// answer from the completed plan's step results.
    async fn finalize(
        &self,
        mut plan: Plan,
        task_context: &TaskContext,
        correlation_id: &str,
    ) -> Result<Plan> {
        let summary = plan
            .steps
            .iter()
            .map(|s| {
                let outcome = s
                    .tool_result
                    .as_ref()
                    .map(|r| r.summary.clone())
                    .unwrap_or_default();
                format!("step {} ({}): {}", s.order, s.tool_name, outcome)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut mapping = HashMap::new();
        mapping.insert("original_question".to_string(), plan.original_question.clone());
        mapping.insert("step_results".to_string(), summary);

        let prompt_type = PromptType::new(FINALIZER_PROMPT);
        let response = self
            .gateway
            .call_llm::<FinalizerOutput>(&prompt_type, &mapping, task_context.quick, false, correlation_id)
            .await;

        match response {
            Ok(parsed) => {
                plan.final_answer = Some(parsed.result.final_answer.clone());
                plan.status = PlanStatus::Finalized;
                self.events.publish(JervisEvent::AgentResponseEvent {
                    context_id: plan.context_id,
                    plan_id: Some(plan.id),
                    response: parsed.result.final_answer,
                });
                Ok(plan)
            }
            Err(err) => {
                error!(plan_id = %plan.id, %err, "finalizer failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ClientId, ContextId};
    use crate::model::ToolResult;
    use async_trait::async_trait;
    use jervis_llm::candidate_selector::{ModelDescriptor, ModelType};
    use jervis_llm::completion::{CompletionRequest, CompletionResponse, ToolCompletionRequest, ToolCompletionResponse};
    use jervis_llm::prompt::{CreativityLevel, PromptRegistry, PromptTemplate};
    use jervis_llm::provider::LlmProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysSucceeds;

    #[async_trait]
    impl ToolRegistry for AlwaysSucceeds {
        async fn execute(&self, tool_name: &str, _instruction: &str, _context: &TaskContext) -> ToolResult {
            ToolResult::success(tool_name, "ok", serde_json::json!({}))
        }

        fn catalog(&self) -> Vec<crate::planner::ToolCatalogEntry> {
            Vec::new()
        }
    }

    /// Fails the first call to `flaky_tool` and succeeds on every call after
    /// that, including for the step that supersedes it during recovery.
    struct FailsOnceThenSucceeds {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolRegistry for FailsOnceThenSucceeds {
        async fn execute(&self, tool_name: &str, _instruction: &str, _context: &TaskContext) -> ToolResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 && tool_name == "flaky_tool" {
                ToolResult::failure(tool_name, "connection reset")
            } else {
                ToolResult::success(tool_name, "ok", serde_json::json!({}))
            }
        }

        fn catalog(&self) -> Vec<crate::planner::ToolCatalogEntry> {
            Vec::new()
        }
    }

    /// Always answers `RECOVERY_REASONING` with a fixed replacement tool
    /// invocation, as valid `ToolSelection` JSON.
    struct RecoveryProvider;

    #[async_trait::async_trait]
    impl LlmProvider for RecoveryProvider {
        fn name(&self) -> &str {
            "recovery-mock"
        }

        fn supports_tools(&self) -> bool {
            false
        }

        fn available_models(&self) -> Vec<String> {
            vec!["recovery-model".to_string()]
        }

        fn default_model(&self) -> &str {
            "recovery-model"
        }

        async fn complete(&self, request: CompletionRequest) -> jervis_llm::error::Result<CompletionResponse> {
            let is_recovery = request.messages.iter().any(|m| m.content.contains("failed tool"));
            let content = if is_recovery {
                serde_json::json!({
                    "tool_name": "retry_tool",
                    "reasoning": "retry with a different tool",
                    "parameters": "find x, alternate route",
                })
                .to_string()
            } else {
                serde_json::json!({ "final_answer": "x found via retry_tool" }).to_string()
            };
            Ok(CompletionResponse {
                content,
                usage: None,
                finish_reason: Some("stop".to_string()),
                model: "recovery-model".to_string(),
            })
        }

        async fn complete_with_tools(
            &self,
            _request: ToolCompletionRequest,
        ) -> jervis_llm::error::Result<ToolCompletionResponse> {
            unimplemented!("recovery prompt never requests tool calling")
        }
    }

    fn gateway_with_recovery_prompt() -> Gateway {
        let mut prompts = PromptRegistry::new();
        prompts.register(
            PromptType::new(RECOVERY_REASONING_PROMPT),
            PromptTemplate {
                system: "recovery".to_string(),
                user: "failed tool {{failed_tool}}: {{error_message}}".to_string(),
                model_type: ModelType::new("recovery_reasoning"),
                creativity: CreativityLevel::PRECISE,
                quick: false,
            },
        );
        prompts.register(
            PromptType::new(FINALIZER_PROMPT),
            PromptTemplate {
                system: "finalizer".to_string(),
                user: "question {{original_question}} results {{step_results}}".to_string(),
                model_type: ModelType::new("recovery_reasoning"),
                creativity: CreativityLevel::PRECISE,
                quick: false,
            },
        );

        let config = jervis_llm::gateway::GatewayConfig::new()
            .with_provider(Arc::new(RecoveryProvider), "https://mock.local")
            .with_model(ModelDescriptor {
                provider: "recovery-mock".to_string(),
                model: "recovery-model".to_string(),
                model_type: ModelType::new("recovery_reasoning"),
                quick: true,
                context_length: 100_000,
                output_budget: 256,
            });

        Gateway::with_noop_gating(jervis_llm::gateway::GatewayConfig { prompts, ..config })
    }

    #[test]
    fn config_defaults_match_spec_recovery_budget() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_parallelism, 4);
        assert_eq!(config.max_recovery_attempts, 3);
    }

    #[tokio::test]
    async fn tool_registry_runs_under_a_task_context() {
        let registry = AlwaysSucceeds;
        let context = TaskContext::new(ClientId::new(), None);
        let result = registry.execute("search", "find x", &context).await;
        assert!(result.success);
        let _ = ContextId::new();
    }

    #[tokio::test]
    async fn a_step_that_fails_then_recovers_lets_the_plan_finalize() {
        let gateway = Arc::new(gateway_with_recovery_prompt());
        let tools: Arc<dyn ToolRegistry> = Arc::new(FailsOnceThenSucceeds {
            calls: AtomicUsize::new(0),
        });
        let events = Arc::new(EventBus::new(16));
        let executor = PlanExecutor::new(gateway, tools, events, ExecutorConfig::default());

        let context_id = ContextId::new();
        let mut plan = Plan::new(context_id, "find x", "find x");
        plan = plan.append_steps(vec![NewStep {
            tool_name: "flaky_tool".to_string(),
            step_instruction: "find x".to_string(),
            depends_on: Vec::new(),
            step_group: None,
        }]);

        let task_context = TaskContext::new(ClientId::new(), None);
        let result = executor
            .execute_plan(plan, &task_context, "corr-recovery")
            .await
            .expect("a successful recovery must let the plan finalize");

        assert_eq!(result.status, PlanStatus::Finalized);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].tool_name, "retry_tool");
        assert_eq!(result.steps[0].status, StepStatus::Done);
    }
}
