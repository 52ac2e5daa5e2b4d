//! LLM provider implementations
//!
//! One provider per wire format, not per vendor: `anthropic` speaks the
//! Claude Messages API, `openai_compatible` speaks the `/v1/chat/completions`
//! shape shared by OpenAI and the many servers that mimic it, and `mock`
//! backs unit tests that should not touch the network.

/// Anthropic Claude provider
pub mod anthropic;
/// Mock provider for tests
pub mod mock;
/// Generic OpenAI-compatible chat-completions provider
pub mod openai_compatible;
