//! LLM Gateway (C5)
//!
//! `Gateway::call_llm` is the single entry point the rest of Jervis uses to
//! talk to a model: look up a prompt template, estimate tokens, pick a
//! candidate sequence (C4), and walk it under domain/provider back-pressure
//! (C2/C3) until one candidate returns a schema-conforming response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

use crate::candidate_selector::{select_candidates, ModelDescriptor, ModelType};
use crate::completion::{CompletionRequest, TokenUsage};
use crate::concurrency::{ConcurrencyManager, NoopConcurrencyManager, NoopRateLimiter, RateLimiter};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::prompt::{PromptRegistry, PromptType};
use crate::provider::LlmProvider;
use crate::token::TokenCounter;

/// Number of times a single candidate is retried with a corrective hint
/// after a schema-parse failure before the gateway advances to the next one
pub const DEFAULT_PARSE_RETRIES: u32 = 1;

/// How long a background-mode call may hold a provider permit before the
/// gateway considers the candidate too slow and advances to the next one
pub const DEFAULT_BACKGROUND_SOFT_TIMEOUT: Duration = Duration::from_secs(20);

/// Maximum attempts (including the first) against a single candidate before
/// a `ProviderTransient` error gives up and advances to the next candidate
pub const DEFAULT_TRANSIENT_RETRIES: u32 = 5;

/// Initial delay before the first retry of a transient failure
pub const DEFAULT_TRANSIENT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Cap on the exponential backoff delay between transient retries
pub const DEFAULT_TRANSIENT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Static configuration the gateway is built from
pub struct GatewayConfig {
    /// All configured models, across every provider and model type
    pub models: Vec<ModelDescriptor>,
    /// Prompt templates keyed by prompt type
    pub prompts: PromptRegistry,
    /// Registered providers, keyed by the name returned from `LlmProvider::name()`
    pub providers: HashMap<String, Arc<dyn LlmProvider>>,
    /// Base URL per provider, used only to resolve a domain for the rate limiter
    pub provider_endpoints: HashMap<String, String>,
    /// Parse-failure retries per candidate before advancing
    pub max_parse_retries: u32,
    /// Soft timeout applied to background-mode calls
    pub background_soft_timeout: Duration,
}

impl GatewayConfig {
    /// Create a configuration with no providers/models registered yet
    #[must_use]
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            prompts: PromptRegistry::new(),
            providers: HashMap::new(),
            provider_endpoints: HashMap::new(),
            max_parse_retries: DEFAULT_PARSE_RETRIES,
            background_soft_timeout: DEFAULT_BACKGROUND_SOFT_TIMEOUT,
        }
    }

    /// Register a provider implementation and its endpoint
    pub fn with_provider(
        mut self,
        provider: Arc<dyn LlmProvider>,
        endpoint: impl Into<String>,
    ) -> Self {
        self.provider_endpoints
            .insert(provider.name().to_string(), endpoint.into());
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Add a model to the catalog the candidate selector draws from
    #[must_use]
    pub fn with_model(mut self, model: ModelDescriptor) -> Self {
        self.models.push(model);
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful `call_llm`
#[derive(Debug, Clone)]
pub struct ParsedResponse<T> {
    /// The schema-conforming result
    pub result: T,
    /// `provider/model` that produced it
    pub model_used: String,
    /// Finish reason reported by the provider, if any
    pub finish_reason: Option<String>,
    /// Token usage reported by the provider, if any
    pub usage: Option<TokenUsage>,
}

/// The LLM Gateway (C5)
pub struct Gateway {
    config: GatewayConfig,
    rate_limiter: Arc<dyn RateLimiter>,
    concurrency: Arc<dyn ConcurrencyManager>,
    tokens: TokenCounter,
}

impl Gateway {
    /// Build a gateway with injected rate limiter / concurrency manager.
    /// Concrete implementations of C2/C3 live in `jervis-core`; tests may
    /// pass the no-op implementations from [`crate::concurrency`].
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        rate_limiter: Arc<dyn RateLimiter>,
        concurrency: Arc<dyn ConcurrencyManager>,
    ) -> Self {
        Self {
            config,
            rate_limiter,
            concurrency,
            tokens: TokenCounter::new(),
        }
    }

    /// Build a gateway with no rate limiting or concurrency gating, for tests
    #[must_use]
    pub fn with_noop_gating(config: GatewayConfig) -> Self {
        Self::new(
            config,
            Arc::new(NoopRateLimiter),
            Arc::new(NoopConcurrencyManager),
        )
    }

    /// `callLlm(promptType, responseSchema, mappingValues, quick, backgroundMode, correlationId)`
    ///
    /// `T` stands in for `responseSchema`: the caller's choice of type *is*
    /// the schema the model's JSON content is validated against.
    #[instrument(skip(self, mapping_values), fields(%correlation_id, prompt_type = %prompt_type, quick, background_mode))]
    pub async fn call_llm<T: DeserializeOwned>(
        &self,
        prompt_type: &PromptType,
        mapping_values: &HashMap<String, String>,
        quick: bool,
        background_mode: bool,
        correlation_id: &str,
    ) -> Result<ParsedResponse<T>> {
        let template = self
            .config
            .prompts
            .get(prompt_type)
            .ok_or_else(|| Error::NotConfigured(format!("no prompt registered for {prompt_type}")))?;

        let (system_prompt, user_prompt) = template.render(mapping_values);
        let estimated_tokens = self
            .tokens
            .estimate_total_request(Some(&system_prompt), &user_prompt);

        let candidates = select_candidates(
            &self.config.models,
            &template.model_type,
            quick || template.quick,
            estimated_tokens,
        );
        if candidates.is_empty() {
            return Err(Error::LlmUnavailable);
        }

        // Background calls favor cheaper/slower candidates: try the catalog
        // in reverse so interactive callers still get the best candidate first.
        let ordered: Vec<&ModelDescriptor> = if background_mode {
            candidates.into_iter().rev().collect()
        } else {
            candidates
        };

        for candidate in ordered {
            match self
                .try_candidate::<T>(candidate, &system_prompt, &user_prompt, template.creativity, background_mode)
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) if err.advances_candidate() || err.is_transient() => {
                    warn!(provider = %candidate.provider, model = %candidate.model, error = %err, "candidate failed, advancing");
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::LlmUnavailable)
    }

    async fn try_candidate<T: DeserializeOwned>(
        &self,
        candidate: &ModelDescriptor,
        system_prompt: &str,
        user_prompt: &str,
        creativity: crate::prompt::CreativityLevel,
        background_mode: bool,
    ) -> Result<ParsedResponse<T>> {
        let provider = self
            .config
            .providers
            .get(&candidate.provider)
            .ok_or_else(|| Error::NotConfigured(candidate.provider.clone()))?;
        let endpoint = self
            .config
            .provider_endpoints
            .get(&candidate.provider)
            .cloned()
            .unwrap_or_default();

        self.rate_limiter.acquire(&endpoint).await;
        let _permit = self.concurrency.acquire(&candidate.provider).await;

        let mut user_prompt = user_prompt.to_string();

        for attempt in 0..=self.config.max_parse_retries {
            let request = CompletionRequest::new(candidate.model.clone())
                .with_message(Message::system(system_prompt))
                .with_message(Message::user(user_prompt.clone()))
                .with_max_tokens(candidate.output_budget)
                .with_temperature(creativity.temperature);

            let response = self.complete_with_transient_retry(provider.as_ref(), request, background_mode).await?;

            match serde_json::from_str::<T>(&response.content) {
                Ok(result) => {
                    return Ok(ParsedResponse {
                        result,
                        model_used: format!("{}/{}", candidate.provider, response.model),
                        finish_reason: response.finish_reason,
                        usage: response.usage,
                    });
                }
                Err(e) => {
                    if attempt < self.config.max_parse_retries {
                        user_prompt.push_str(
                            "\n\nYour previous reply did not parse as valid JSON conforming to the required schema. Return only valid JSON conforming to the schema.",
                        );
                        continue;
                    }
                    return Err(Error::LlmParseFailure(e.to_string()));
                }
            }
        }

        unreachable!("loop always returns on its last iteration")
    }

    /// Run a single completion call against `provider`, retrying
    /// `ProviderTransient`/network/rate-limit failures against the *same*
    /// candidate with exponential backoff before giving up. Auth and
    /// schema-parse failures are not retried here; they advance to the next
    /// candidate in [`Self::call_llm`] instead.
    async fn complete_with_transient_retry(
        &self,
        provider: &(dyn LlmProvider + 'static),
        request: crate::completion::CompletionRequest,
        background_mode: bool,
    ) -> Result<crate::completion::CompletionResponse> {
        let mut delay = DEFAULT_TRANSIENT_INITIAL_DELAY;

        for attempt in 1..=DEFAULT_TRANSIENT_RETRIES {
            let call = provider.complete(request.clone());
            let outcome = if background_mode {
                match tokio::time::timeout(self.config.background_soft_timeout, call).await {
                    Ok(result) => result,
                    Err(_) => return Err(Error::Timeout(self.config.background_soft_timeout.as_millis() as u64)),
                }
            } else {
                call.await
            };

            match outcome {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < DEFAULT_TRANSIENT_RETRIES => {
                    warn!(
                        provider = %provider.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient provider failure, retrying candidate"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(DEFAULT_TRANSIENT_MAX_DELAY);
                }
                Err(err) => return Err(err),
            }
        }

        unreachable!("loop always returns on its last iteration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{CreativityLevel, PromptTemplate};
    use crate::providers::mock::MockProvider;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Answer {
        #[allow(dead_code)]
        text: String,
    }

    fn gateway_with_mock_provider() -> Gateway {
        let mut prompts = PromptRegistry::new();
        prompts.register(
            PromptType::new("TEST"),
            PromptTemplate {
                system: "system".to_string(),
                user: "user {{question}}".to_string(),
                model_type: ModelType::new("planning"),
                creativity: CreativityLevel::PRECISE,
                quick: false,
            },
        );

        let config = GatewayConfig::new()
            .with_provider(Arc::new(MockProvider::new()), "https://mock.local")
            .with_model(ModelDescriptor {
                provider: "mock".to_string(),
                model: "mock-model".to_string(),
                model_type: ModelType::new("planning"),
                quick: true,
                context_length: 100_000,
                output_budget: 1024,
            });

        Gateway::with_noop_gating(GatewayConfig { prompts, ..config })
    }

    #[tokio::test]
    async fn unknown_prompt_type_is_not_configured() {
        let gateway = gateway_with_mock_provider();
        let mapping = HashMap::new();
        let result = gateway
            .call_llm::<Answer>(&PromptType::new("MISSING"), &mapping, false, false, "corr-1")
            .await;
        assert!(matches!(result, Err(Error::NotConfigured(_))));
    }

    #[tokio::test]
    async fn parse_failure_exhausts_the_only_candidate_as_unavailable() {
        // MockProvider always returns the literal string "mock response",
        // which is not valid JSON. With a single candidate configured, the
        // gateway exhausts its parse retries and then its candidate list,
        // surfacing LlmUnavailable rather than panicking.
        let gateway = gateway_with_mock_provider();
        let mut mapping = HashMap::new();
        mapping.insert("question".to_string(), "hi".to_string());
        let result = gateway
            .call_llm::<Answer>(&PromptType::new("TEST"), &mapping, false, false, "corr-2")
            .await;
        assert!(matches!(result, Err(Error::LlmUnavailable)));
    }
}
