//! Token counting and budget management
//!
//! This module provides token counting utilities using tiktoken's cl100k_base encoding,
//! which is compatible with most modern LLMs.

use crate::message::Message;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::warn;

/// Tokens reserved for the model's response when estimating a request budget
pub const RESPONSE_BUFFER: u32 = 500;

/// Safety margin subtracted from the budget when word-truncating an
/// oversized sentence in [`TokenCounter::process_with_limit`]
const TRUNCATION_SAFETY_MARGIN: usize = 10;

/// Global tokenizer instance (initialized once, thread-safe)
static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    cl100k_base().expect("cl100k_base tokenizer is a compile-time constant and should never fail")
});

// ============================================================================
// Token Counter
// ============================================================================

/// Token counter for estimating message token usage
///
/// Uses tiktoken's cl100k_base encoding (GPT-5.2, Claude 3, etc.)
/// for accurate token estimation across modern LLMs.
///
/// This is a zero-cost wrapper around the global tokenizer instance.
#[derive(Clone, Copy)]
pub struct TokenCounter;

impl TokenCounter {
    /// Create a new token counter
    ///
    /// Uses cl100k_base encoding which is compatible with:
    /// - OpenAI GPT-4, GPT-5.2, GPT-3.5-turbo
    /// - Anthropic Claude 3.x (approximate)
    /// - Most modern LLMs
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Count tokens in a string
    ///
    /// Falls back to `len(text) / 4` with a warning if the encoder panics
    /// (malformed input the BPE tables can't tokenize).
    #[must_use]
    pub fn count_tokens(&self, text: &str) -> usize {
        catch_unwind(AssertUnwindSafe(|| TOKENIZER.encode_with_special_tokens(text).len()))
            .unwrap_or_else(|_| {
                warn!(chars = text.len(), "tokenizer failed, falling back to len/4 estimate");
                text.len() / 4
            })
    }

    /// `estimateTotalRequest`: system + user token counts plus the reserved
    /// response buffer, used to size the candidate search in C4
    #[must_use]
    pub fn estimate_total_request(&self, system: Option<&str>, user: &str) -> u32 {
        let system_tokens = system.map(|s| self.count_tokens(s)).unwrap_or(0);
        let user_tokens = self.count_tokens(user);
        (system_tokens + user_tokens) as u32 + RESPONSE_BUFFER
    }

    /// Chunk `text` by sentence terminators (`.`, `!`, `?`) so that each
    /// chunk fits within `max_tokens`. If a single sentence exceeds the
    /// budget on its own, it is truncated word-wise with a safety margin and
    /// an ellipsis sentinel is appended. Returns only the first chunk, which
    /// is the authoritative summary for callers that need one excerpt.
    #[must_use]
    pub fn process_with_limit(&self, text: &str, max_tokens: usize) -> String {
        let sentences = split_into_sentences(text);
        let mut chunk = String::new();
        let mut chunk_tokens = 0usize;

        for sentence in &sentences {
            let sentence_tokens = self.count_tokens(sentence);

            if sentence_tokens > max_tokens {
                if chunk.is_empty() {
                    return self.truncate_to_budget(sentence, max_tokens);
                }
                break;
            }

            if chunk_tokens + sentence_tokens > max_tokens {
                break;
            }

            chunk.push_str(sentence);
            chunk_tokens += sentence_tokens;
        }

        if chunk.is_empty() && !sentences.is_empty() {
            return self.truncate_to_budget(&sentences[0], max_tokens);
        }

        chunk
    }

    /// Word-wise truncation of a single oversized sentence, leaving a safety
    /// margin below `max_tokens` before appending an ellipsis sentinel
    fn truncate_to_budget(&self, sentence: &str, max_tokens: usize) -> String {
        let budget = max_tokens.saturating_sub(TRUNCATION_SAFETY_MARGIN);
        let mut result = String::new();

        for word in sentence.split_whitespace() {
            let candidate = if result.is_empty() {
                word.to_string()
            } else {
                format!("{result} {word}")
            };
            if self.count_tokens(&candidate) > budget {
                break;
            }
            result = candidate;
        }

        result.push_str(" ...");
        result
    }

    /// Count tokens in a message (includes role overhead)
    ///
    /// Adds overhead for message structure:
    /// - Role marker: ~4 tokens
    /// - Message separators: ~2 tokens
    #[must_use]
    pub fn count_message_tokens(&self, message: &Message) -> usize {
        const MESSAGE_OVERHEAD: usize = 6; // role + separators
        self.count_tokens(&message.content) + MESSAGE_OVERHEAD
    }

    /// Count total tokens in a conversation
    #[must_use]
    pub fn count_conversation_tokens(&self, messages: &[Message]) -> usize {
        const CONVERSATION_OVERHEAD: usize = 3; // start/end tokens
        messages
            .iter()
            .map(|m| self.count_message_tokens(m))
            .sum::<usize>()
            + CONVERSATION_OVERHEAD
    }

    /// Estimate tokens for a tool definition
    #[must_use]
    pub fn count_tool_tokens(&self, tool: &ToolDefinition) -> usize {
        const TOOL_OVERHEAD: usize = 10; // structure overhead
        self.count_tokens(&tool.name)
            + self.count_tokens(&tool.description)
            + self.count_tokens(&tool.parameters.to_string())
            + TOOL_OVERHEAD
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

// Thread-safe global token counter
lazy_static::lazy_static! {
    /// Global token counter instance for convenience
    pub static ref TOKEN_COUNTER: TokenCounter = TokenCounter::new();
}

/// Convenience function to count tokens in text
#[must_use]
pub fn count_tokens(text: &str) -> usize {
    TOKEN_COUNTER.count_tokens(text)
}

/// Convenience function to count tokens in messages
#[must_use]
pub fn count_message_tokens(messages: &[Message]) -> usize {
    TOKEN_COUNTER.count_conversation_tokens(messages)
}

/// Split text into sentences on `.`, `!`, `?`, keeping the terminator
/// attached to each returned chunk
fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current);
    }
    sentences
}

// ============================================================================
// Token Budget
// ============================================================================

/// Token budget configuration for different task types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Maximum tokens to generate for this task type
    pub max_tokens: u32,
    /// Recommended temperature for this task type
    pub temperature: f32,
}

impl TokenBudget {
    /// Create a new token budget
    #[must_use]
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_counter_basic() {
        let counter = TokenCounter::new();

        // Simple text
        let tokens = counter.count_tokens("Hello, world!");
        assert!(tokens > 0);
        assert!(tokens < 10); // Should be ~4 tokens

        // Empty string
        assert_eq!(counter.count_tokens(""), 0);
    }

    #[test]
    fn test_token_counter_message() {
        let counter = TokenCounter::new();

        let message = Message::user("Hello, how are you?");
        let tokens = counter.count_message_tokens(&message);

        // Should include content + overhead
        let content_tokens = counter.count_tokens("Hello, how are you?");
        assert!(tokens > content_tokens);
    }

    #[test]
    fn test_token_counter_conversation() {
        let counter = TokenCounter::new();

        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hello!"),
            Message::assistant("Hi there! How can I help you?"),
        ];

        let total = counter.count_conversation_tokens(&messages);

        // Should be sum of messages + overhead
        let sum: usize = messages
            .iter()
            .map(|m| counter.count_message_tokens(m))
            .sum();
        assert!(total >= sum);
    }

    #[test]
    fn test_token_counter_tool() {
        let counter = TokenCounter::new();

        let tool = ToolDefinition::new(
            "get_weather",
            "Get the current weather for a location",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "City name"}
                },
                "required": ["location"]
            }),
        );

        let tokens = counter.count_tool_tokens(&tool);
        assert!(tokens > 0);
    }

    #[test]
    fn test_global_token_counter() {
        // Test convenience functions
        let tokens = count_tokens("Hello, world!");
        assert!(tokens > 0);

        let messages = vec![Message::user("Hello!")];
        let msg_tokens = count_message_tokens(&messages);
        assert!(msg_tokens > tokens); // Should include overhead
    }

    #[test]
    fn test_token_budget_default() {
        let budget = TokenBudget::default();
        assert_eq!(budget.max_tokens, 2048);
        assert_eq!(budget.temperature, 0.7);
    }

    #[test]
    fn test_token_budget_new() {
        let budget = TokenBudget::new(500, 0.3);
        assert_eq!(budget.max_tokens, 500);
        assert_eq!(budget.temperature, 0.3);
    }

    #[test]
    fn test_estimate_total_request_includes_response_buffer() {
        let counter = TokenCounter::new();
        let without_system = counter.estimate_total_request(None, "Hello!");
        let user_tokens = counter.count_tokens("Hello!") as u32;
        assert_eq!(without_system, user_tokens + RESPONSE_BUFFER);

        let with_system = counter.estimate_total_request(Some("Be concise."), "Hello!");
        assert!(with_system > without_system);
    }

    #[test]
    fn test_process_with_limit_returns_whole_text_when_it_fits() {
        let counter = TokenCounter::new();
        let text = "Short sentence.";
        let chunk = counter.process_with_limit(text, 1000);
        assert_eq!(chunk, text);
    }

    #[test]
    fn test_process_with_limit_stops_at_sentence_boundary() {
        let counter = TokenCounter::new();
        let text = "First sentence here. Second sentence follows. Third one too.";
        let first_sentence_tokens = counter.count_tokens("First sentence here. ");
        let chunk = counter.process_with_limit(text, first_sentence_tokens + 1);
        assert!(chunk.starts_with("First sentence here."));
        assert!(!chunk.contains("Second"));
    }

    #[test]
    fn test_process_with_limit_truncates_oversized_sentence() {
        let counter = TokenCounter::new();
        let long_sentence: String = std::iter::repeat("word ").take(200).collect();
        let chunk = counter.process_with_limit(&long_sentence, 10);
        assert!(chunk.ends_with("..."));
        assert!(counter.count_tokens(&chunk) <= 10 + 5);
    }
}
