//! Jervis Core - orchestration engine
//!
//! This crate provides the stateful machinery the rest of Jervis is built
//! on:
//! - `model`: the data model (Client, Project, Connection, Plan/PlanStep, …)
//! - `ids`: opaque, time-sortable identifiers shared across the data model
//! - `planner`: two-phase planning (C9) — goal decomposition, then tool
//!   reasoning, producing a `Plan`
//! - `concurrency`: the Domain Rate Limiter (C2) and Provider Concurrency
//!   Manager (C3), injected into `jervis-llm`'s Gateway
//! - `event_bus`: the Notification Bus (C12)
//! - `dialog`: the Dialog Coordinator (C13)
//! - `executor`: the Plan Executor (C10) — ready-set scheduling, recovery,
//!   and finalization
//! - `tool_registry`: the seam the executor calls tools through (C11)
//! - `memory`: session and working memory contexts
//! - `utils`: retry logic, circuit breaker, and metrics

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod concurrency;
pub mod dialog;
pub mod error;
pub mod event_bus;
pub mod executor;
pub mod ids;
pub mod memory;
pub mod model;
pub mod planner;
pub mod tool_registry;
pub mod utils;

pub use concurrency::{
    DomainRateLimiter, ProviderConcurrencyManager, ProviderLimits, ProviderMode,
    RateLimiterConfig,
};
pub use dialog::{DialogCoordinator, DialogOutcome, SharedDialogCoordinator};
pub use error::{Error, Result};
pub use event_bus::{EventBus, JervisEvent};
pub use executor::{ExecutorConfig, PlanExecutor};
pub use memory::{MemoryStore, RedisStore, SessionContext, SessionStore, ToolExecution, WorkingMemory};
pub use planner::{Planner, ToolCatalog, ToolCatalogEntry};
pub use tool_registry::{NoopToolRegistry, ToolRegistry};
pub use utils::{
    metrics_global, retry_with_backoff, CircuitBreaker, CircuitBreakerConfig, CircuitState,
    Counter, Gauge, Histogram, MetricsRegistry, RateLimitConfig, RateLimitResult, RateLimiter,
    RetryConfig, TieredRateLimiter, Timer,
};
