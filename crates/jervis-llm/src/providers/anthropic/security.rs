//! Error-message sanitization for the Anthropic provider
//!
//! Anthropic error bodies occasionally echo back request headers or internal
//! routing details. Strip anything that looks like a credential before the
//! message reaches logs or a caller.

const KEY_PATTERNS: &[&str] = &["x-api-key", "api_key", "api-key", "authorization", "bearer"];

/// Sanitize an Anthropic API error message for safe display/logging
#[must_use]
pub(crate) fn sanitize_api_error(message: &str) -> String {
    let lower = message.to_lowercase();

    if KEY_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "authentication error: invalid or missing credentials".to_string();
    }
    if lower.contains("overloaded") || lower.contains("rate_limit") || lower.contains("429") {
        return "rate limit exceeded, retry with backoff".to_string();
    }
    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_credential_errors() {
        let sanitized = sanitize_api_error("Invalid x-api-key header");
        assert!(!sanitized.contains("x-api-key"));
        assert!(sanitized.contains("authentication"));
    }

    #[test]
    fn flags_overload_as_rate_limit() {
        let sanitized = sanitize_api_error("overloaded: too many requests");
        assert!(sanitized.contains("rate limit"));
    }
}
