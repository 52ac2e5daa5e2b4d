//! Error kinds for jervis-core (§7)
//!
//! Variants name error *kinds*, not wrapped library types, so callers can
//! reason about retry/recovery policy (planner re-prompt, step recovery,
//! plan failure) independently of which crate raised the error.

use thiserror::Error;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input (blank title, invalid slug, …) — surfaced to caller, no retry
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// Planner output invalid (cycle) — planner is re-prompted once with the
    /// validator's message
    #[error("cyclic dependency among goals: {0}")]
    CyclicDependency(String),

    /// Planner referenced a goal that doesn't exist
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// Attempted to transition an `IndexedItem` out of `INDEXED`, or a
    /// concurrent modification — logged, not thrown; reconciled next pass
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// The LLM Gateway (C5) exhausted every model candidate for a step
    #[error("llm unavailable: {0}")]
    LlmUnavailable(String),

    /// Underlying LLM error, from `jervis-llm`
    #[error("llm error: {0}")]
    Llm(#[from] jervis_llm::Error),

    /// Tool execution error
    #[error("tool error: {0}")]
    Tool(String),

    /// Memory/persistence error
    #[error("memory error: {0}")]
    Memory(String),

    /// The operation was cancelled (plan cancellation, dialog cancellation)
    #[error("cancelled")]
    Cancelled,

    /// The operation timed out
    #[error("timed out after {0}ms")]
    TimedOut(u64),

    /// Catch-all for infrastructure errors (serialization, I/O, …)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is a planner-validation failure that should
    /// trigger a single re-prompt rather than failing the plan outright.
    #[must_use]
    pub fn is_planner_revalidation(&self) -> bool {
        matches!(self, Error::CyclicDependency(_) | Error::MissingDependency(_))
    }

    /// Whether this error is a pure control-flow signal that should bubble
    /// up rather than be retried or recovered.
    #[must_use]
    pub fn is_control_flow(&self) -> bool {
        matches!(self, Error::Cancelled | Error::TimedOut(_))
    }
}
