//! Jervis Tools - Tool Registry and Execution Engine (C11)
//!
//! Implements `jervis_core::tool_registry::ToolRegistry` against a small
//! catalog of example tools: repository file reads, web search, and a pure
//! LLM-reasoning fallback.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod registry;
pub mod tools;

pub use error::{Error, Result};
pub use registry::{JervisToolRegistry, Tool};
pub use tools::{AnalysisReasoningTool, RepositoryReadTool, WebSearchTool};
