//! Configuration for the Plan Executor (C10).

/// Prompt type the gateway resolves for the finalizer's synthesis call.
pub const FINALIZER_PROMPT: &str = "FINALIZER";

/// Tunables for [`super::PlanExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of ready steps run concurrently
    pub max_parallelism: usize,
    /// Consecutive recovery attempts for the same step before the plan fails
    pub max_recovery_attempts: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallelism: 4,
            max_recovery_attempts: 3,
        }
    }
}
