//! Jervis LLM - provider abstraction, token accounting and model selection
//!
//! This crate provides the gateway Jervis's orchestrator calls to talk to
//! language models:
//! - `provider`: the `LlmProvider` trait every backend implements
//! - `providers`: concrete backends (Anthropic Messages API, generic
//!   OpenAI-compatible chat completions, and a mock for tests)
//! - `token`: deterministic token counting and budget-aware chunking
//! - `concurrency`: per-domain rate limiting and per-provider back-pressure
//! - `candidate_selector`: picks an ordered sequence of models to try
//! - `gateway`: ties the above into a single `callLlm`-shaped entry point

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Model candidate selection (C4)
pub mod candidate_selector;
/// Completion request/response types
pub mod completion;
/// Per-domain and per-provider concurrency control (C2, C3)
pub mod concurrency;
/// Error types
pub mod error;
/// Gateway tying token accounting, candidate selection and providers together (C5)
pub mod gateway;
/// Conversation message types
pub mod message;
/// Prompt template rendering
pub mod prompt;
/// Provider abstraction trait
pub mod provider;
/// Concrete provider implementations
pub mod providers;
/// Token counting and budget enforcement (C1)
pub mod token;
/// Tool/function-calling types
pub mod tools;
/// Shared helpers (API key masking, error sanitization)
pub mod util;

pub use candidate_selector::{select_candidates, ModelDescriptor, ModelType};
pub use completion::{
    CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayConfig, ParsedResponse};
pub use message::{ImageContent, Message, MessageRole};
pub use provider::LlmProvider;
pub use token::{count_message_tokens, count_tokens, TokenBudget, TokenCounter, TOKEN_COUNTER};
pub use tools::{ToolCall, ToolChoice, ToolDefinition};
