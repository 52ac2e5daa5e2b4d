//! Data model (§3): tenants, connections, and the plan/step graph a task is
//! executed as.

mod client;
mod connection;
mod plan;
mod project;
mod task_context;
mod tool_result;

pub use client::Client;
pub use connection::{AuthConfig, Capability, Connection, ConnectionProvider};
pub use plan::{NewStep, Plan, PlanStatus, PlanStep, StepStatus};
pub use project::{IndexingRules, Project};
pub use task_context::TaskContext;
pub use tool_result::ToolResult;
