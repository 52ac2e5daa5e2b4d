//! Model Candidate Selector (C4)
//!
//! Turns `(modelType, quickOnly, estimatedTokens)` into an ordered, non-empty
//! sequence of models the gateway should try in turn.

use serde::{Deserialize, Serialize};

/// Opaque model-type tag, config-driven (e.g. "planning", "synthesis", "tool_reasoning")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelType(pub String);

impl ModelType {
    /// Wrap a string as a model type tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One configured model, as known to the candidate selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Provider this model is served by (must match an `LlmProvider::name()`)
    pub provider: String,
    /// Model identifier passed to the provider
    pub model: String,
    /// The model type this descriptor belongs to
    pub model_type: ModelType,
    /// Whether this model is flagged for quick-mode preference
    pub quick: bool,
    /// Maximum context length (input + output) in tokens
    pub context_length: u32,
    /// Output token budget used as `max_tokens` when calling this model
    pub output_budget: u32,
}

/// Select an ordered, non-empty sequence of candidates to try.
///
/// `catalog` is the full configured model list, typically coming from the
/// bound `GatewayConfig`. Returns candidates in configuration order; falls
/// back to the single model with the largest context length if none of the
/// type-and-capacity-filtered set qualifies. Returns an empty slice only when
/// no model of `model_type` exists in the catalog at all.
#[must_use]
pub fn select_candidates<'a>(
    catalog: &'a [ModelDescriptor],
    model_type: &ModelType,
    quick_only: bool,
    estimated_tokens: u32,
) -> Vec<&'a ModelDescriptor> {
    let of_type: Vec<&ModelDescriptor> = catalog
        .iter()
        .filter(|m| &m.model_type == model_type)
        .collect();

    if of_type.is_empty() {
        return Vec::new();
    }

    let quick_filtered: Vec<&ModelDescriptor> = if quick_only {
        of_type.iter().copied().filter(|m| m.quick).collect()
    } else {
        of_type.clone()
    };

    let capacity_filtered: Vec<&ModelDescriptor> = quick_filtered
        .iter()
        .copied()
        .filter(|m| m.context_length >= estimated_tokens)
        .collect();

    if !capacity_filtered.is_empty() {
        return capacity_filtered;
    }

    // Best-effort fallback: the single largest-context model from whichever
    // pool survived the quick-only filter (or the whole type, if that pool
    // was also empty — we'd rather overflow a model than return nothing).
    let fallback_pool = if quick_filtered.is_empty() {
        &of_type
    } else {
        &quick_filtered
    };

    fallback_pool
        .iter()
        .copied()
        .max_by_key(|m| m.context_length)
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(provider: &str, model: &str, quick: bool, context: u32) -> ModelDescriptor {
        ModelDescriptor {
            provider: provider.to_string(),
            model: model.to_string(),
            model_type: ModelType::new("planning"),
            quick,
            context_length: context,
            output_budget: 4096,
        }
    }

    #[test]
    fn returns_empty_when_type_unknown() {
        let catalog = vec![model("openai", "gpt", false, 128_000)];
        let result = select_candidates(&catalog, &ModelType::new("synthesis"), false, 1000);
        assert!(result.is_empty());
    }

    #[test]
    fn filters_by_capacity_in_config_order() {
        let catalog = vec![
            model("openai", "small", false, 8_000),
            model("openai", "big", false, 128_000),
        ];
        let result = select_candidates(&catalog, &ModelType::new("planning"), false, 50_000);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].model, "big");
    }

    #[test]
    fn falls_back_to_largest_context_when_none_fit() {
        let catalog = vec![
            model("openai", "small", false, 4_000),
            model("openai", "medium", false, 8_000),
        ];
        let result = select_candidates(&catalog, &ModelType::new("planning"), false, 50_000);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].model, "medium");
    }

    #[test]
    fn quick_only_filters_before_capacity() {
        let mut catalog = vec![
            model("openai", "slow-big", false, 128_000),
            model("openai", "fast-small", true, 8_000),
        ];
        catalog[1].quick = true;
        let result = select_candidates(&catalog, &ModelType::new("planning"), true, 1_000);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].model, "fast-small");
    }

    #[test]
    fn never_empty_when_type_exists() {
        let catalog = vec![model("openai", "only", true, 1_000)];
        let result = select_candidates(&catalog, &ModelType::new("planning"), false, 999_999);
        assert_eq!(result.len(), 1);
    }
}
