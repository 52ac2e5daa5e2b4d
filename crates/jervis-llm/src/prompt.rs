//! Prompt templates and creativity-level parameterization
//!
//! A `PromptType` names a reusable `(systemPrompt, userPrompt, modelType,
//! creativity)` bundle; the gateway looks one up, substitutes the caller's
//! mapping values, and uses the resolved `(temperature, top_p)` for the
//! completion call.

use std::collections::HashMap;

use crate::candidate_selector::ModelType;

/// Fixed prompt type used by the RAG pipeline's synthesis step (C6)
pub const SYNTHESIS_PROMPT: &str = "SYNTHESIS";

/// Prompt type used when the executor inserts a recovery-reasoning step (§7)
pub const RECOVERY_REASONING_PROMPT: &str = "RECOVERY_REASONING";

/// Opaque prompt-type tag, config-driven
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptType(pub String);

impl PromptType {
    /// Wrap a string as a prompt type tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named `(temperature, top_p)` bundle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreativityLevel {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
}

impl CreativityLevel {
    /// Deterministic, low-variance output — used for parsing/tool-reasoning prompts
    pub const PRECISE: Self = Self {
        temperature: 0.1,
        top_p: 0.9,
    };
    /// General-purpose default
    pub const BALANCED: Self = Self {
        temperature: 0.7,
        top_p: 0.95,
    };
    /// Higher-variance output — used for open-ended synthesis
    pub const CREATIVE: Self = Self {
        temperature: 1.0,
        top_p: 1.0,
    };
}

/// A reusable prompt bundle
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// System prompt, with `{{key}}` placeholders
    pub system: String,
    /// User prompt, with `{{key}}` placeholders
    pub user: String,
    /// Model type this prompt is routed to
    pub model_type: ModelType,
    /// Creativity level this prompt resolves to
    pub creativity: CreativityLevel,
    /// Whether this prompt prefers quick/cheap candidates
    pub quick: bool,
}

impl PromptTemplate {
    /// Substitute `{{key}}` placeholders in both system and user prompts
    #[must_use]
    pub fn render(&self, mapping_values: &HashMap<String, String>) -> (String, String) {
        (
            substitute(&self.system, mapping_values),
            substitute(&self.user, mapping_values),
        )
    }
}

fn substitute(template: &str, mapping_values: &HashMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in mapping_values {
        rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
    }
    rendered
}

/// A registry of prompt templates keyed by [`PromptType`]
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    templates: HashMap<PromptType, PromptTemplate>,
}

impl PromptRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt template under the given type
    pub fn register(&mut self, prompt_type: PromptType, template: PromptTemplate) {
        self.templates.insert(prompt_type, template);
    }

    /// Look up a template by prompt type
    #[must_use]
    pub fn get(&self, prompt_type: &PromptType) -> Option<&PromptTemplate> {
        self.templates.get(prompt_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_mapping_values() {
        let template = PromptTemplate {
            system: "You answer as {{persona}}.".to_string(),
            user: "Question: {{question}}".to_string(),
            model_type: ModelType::new("synthesis"),
            creativity: CreativityLevel::BALANCED,
            quick: false,
        };

        let mut mapping = HashMap::new();
        mapping.insert("persona".to_string(), "an assistant".to_string());
        mapping.insert("question".to_string(), "what is Jervis?".to_string());

        let (system, user) = template.render(&mapping);
        assert_eq!(system, "You answer as an assistant.");
        assert_eq!(user, "Question: what is Jervis?");
    }

    #[test]
    fn registry_round_trips() {
        let mut registry = PromptRegistry::new();
        let prompt_type = PromptType::new(SYNTHESIS_PROMPT);
        registry.register(
            prompt_type.clone(),
            PromptTemplate {
                system: "system".to_string(),
                user: "user".to_string(),
                model_type: ModelType::new("synthesis"),
                creativity: CreativityLevel::CREATIVE,
                quick: false,
            },
        );
        assert!(registry.get(&prompt_type).is_some());
        assert!(registry.get(&PromptType::new("UNKNOWN")).is_none());
    }
}
