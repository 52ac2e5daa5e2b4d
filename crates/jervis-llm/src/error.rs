//! Error types for jervis-llm

use thiserror::Error;

/// LLM error type
///
/// Variants map to the error *kinds* callers reason about when deciding
/// whether to retry, advance to the next model candidate, or give up.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Generic API error surfaced by a provider
    #[error("api error: {0}")]
    Api(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimit,

    /// Response body could not be deserialized at the transport level
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Model output did not conform to the requested response schema.
    /// Retried once against the same candidate with a corrective hint before
    /// advancing to the next candidate.
    #[error("llm response did not match schema: {0}")]
    LlmParseFailure(String),

    /// Every model candidate was exhausted without a usable response
    #[error("no model candidate produced a usable response")]
    LlmUnavailable,

    /// Transient provider failure (network error, 5xx, 429) — retried with
    /// exponential backoff before advancing to the next candidate
    #[error("transient provider failure: {0}")]
    ProviderTransient(String),

    /// Provider rejected credentials (401/403) — not retried
    #[error("provider authentication failed: {0}")]
    ProviderAuth(String),

    /// Network transport error
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Caller-supplied input failed validation
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// The operation was cancelled
    #[error("cancelled")]
    Cancelled,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error should be retried against the same candidate with
    /// exponential backoff (§7 `ProviderTransient`)
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ProviderTransient(_) | Error::RateLimit | Error::Network(_))
    }

    /// Whether this error should immediately advance to the next model
    /// candidate rather than retry
    #[must_use]
    pub fn advances_candidate(&self) -> bool {
        matches!(
            self,
            Error::ProviderAuth(_) | Error::LlmUnavailable | Error::LlmParseFailure(_)
        )
    }
}
