//! Generic OpenAI-compatible chat-completions provider
//!
//! Targets the `/v1/chat/completions` wire format shared by OpenAI itself and
//! the large family of self-hosted/gateway servers that mimic it (vLLM,
//! Ollama's OpenAI shim, OpenRouter, local llama.cpp servers, ...). One
//! provider, configured with a base URL and a model list, stands in for all
//! of them rather than a bespoke client per vendor.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::completion::{
    CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
use crate::error::{Error, Result};
use crate::message::{Message, MessageRole};
use crate::provider::LlmProvider;
use crate::tools::{ToolCall, ToolChoice, ToolDefinition};
use crate::util::mask_api_key;

/// Default base URL for the OpenAI API itself
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Provider name, used for logging and gateway routing (e.g. "openai", "openrouter")
    pub name: String,
    /// API key; empty string for endpoints that need none (local servers)
    pub api_key: String,
    /// Base URL, no trailing slash
    pub base_url: String,
    /// Default model identifier
    pub default_model: String,
    /// Models this provider is configured to offer
    pub models: Vec<String>,
    /// Whether the endpoint accepts the `tools` field
    pub supports_tools: bool,
    /// Request timeout
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("name", &self.name)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("models", &self.models)
            .field("supports_tools", &self.supports_tools)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiCompatibleConfig {
    /// Create a configuration pointed at the official OpenAI API
    #[must_use]
    pub fn new(name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            models: vec![DEFAULT_MODEL.to_string()],
            supports_tools: true,
            timeout: Duration::from_secs(60),
        }
    }

    /// Build configuration from environment variables with a given prefix,
    /// e.g. prefix `"OPENAI"` reads `OPENAI_API_KEY`/`OPENAI_BASE_URL`/`OPENAI_MODEL`
    pub fn from_env(name: impl Into<String>, prefix: &str) -> Result<Self> {
        let name = name.into();
        let api_key = std::env::var(format!("{prefix}_API_KEY")).unwrap_or_default();
        let base_url = std::env::var(format!("{prefix}_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let default_model = std::env::var(format!("{prefix}_MODEL"))
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            name,
            api_key,
            base_url,
            default_model: default_model.clone(),
            models: vec![default_model],
            supports_tools: true,
            timeout: Duration::from_secs(60),
        })
    }

    /// Override the model catalog exposed by this provider
    #[must_use]
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    r#type: &'static str,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseToolCall {
    id: String,
    function: ChatResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ChatResponseFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
    #[serde(default)]
    r#type: Option<String>,
}

fn to_chat_message(msg: &Message) -> ChatMessage {
    let role = match msg.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    };
    ChatMessage {
        role,
        content: Some(msg.content.clone()),
        tool_call_id: msg.tool_call_id.clone(),
        name: msg.name.clone(),
    }
}

fn to_chat_tool(tool: &ToolDefinition) -> ChatTool {
    ChatTool {
        r#type: "function",
        function: ChatFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

fn to_tool_choice(choice: &ToolChoice) -> Option<serde_json::Value> {
    match choice {
        ToolChoice::Auto => Some(serde_json::json!("auto")),
        ToolChoice::None => Some(serde_json::json!("none")),
        ToolChoice::Required => Some(serde_json::json!("required")),
        ToolChoice::Tool(name) => Some(serde_json::json!({
            "type": "function",
            "function": { "name": name }
        })),
    }
}

fn sanitize_api_error(message: &str) -> String {
    let lower = message.to_lowercase();
    if lower.contains("api_key") || lower.contains("authorization") || lower.contains("bearer") {
        return "authentication error: invalid or missing credentials".to_string();
    }
    message.to_string()
}

/// Generic OpenAI-compatible chat-completions provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider for the given configuration
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn send_request(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        debug!(provider = %self.config.name, %url, "sending chat completion request");

        let mut builder = self.client.post(&url).json(&request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(Error::RateLimit);
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                let message = if let Ok(error) = serde_json::from_str::<ChatErrorBody>(&body) {
                    sanitize_api_error(&error.error.message)
                } else {
                    sanitize_api_error(&format!("HTTP {status}: {body}"))
                };
                return Err(Error::ProviderAuth(message));
            }
            if status.is_server_error() {
                let message = if let Ok(error) = serde_json::from_str::<ChatErrorBody>(&body) {
                    sanitize_api_error(&error.error.message)
                } else {
                    sanitize_api_error(&format!("HTTP {status}: {body}"))
                };
                return Err(Error::ProviderTransient(message));
            }
            if let Ok(error) = serde_json::from_str::<ChatErrorBody>(&body) {
                return Err(Error::Api(sanitize_api_error(&error.error.message)));
            }
            return Err(Error::Api(sanitize_api_error(&format!(
                "HTTP {status}: {body}"
            ))));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn supports_tools(&self) -> bool {
        self.config.supports_tools
    }

    fn available_models(&self) -> Vec<String> {
        self.config.models.clone()
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model.clone()
        };

        let chat_request = ChatRequest {
            model: model.clone(),
            messages: request.messages.iter().map(to_chat_message).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop.clone(),
            tools: None,
            tool_choice: None,
        };

        let response = self.send_request(chat_request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("empty choices array".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
            model: response.model,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.request.model, tools = request.tools.len()))]
    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse> {
        let model = if request.request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.request.model.clone()
        };

        let chat_request = ChatRequest {
            model: model.clone(),
            messages: request
                .request
                .messages
                .iter()
                .map(to_chat_message)
                .collect(),
            max_tokens: request.request.max_tokens,
            temperature: request.request.temperature,
            stop: request.request.stop.clone(),
            tools: Some(request.tools.iter().map(to_chat_tool).collect()),
            tool_choice: to_tool_choice(&request.tool_choice),
        };

        let response = self.send_request(chat_request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("empty choices array".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(ToolCompletionResponse {
            content: choice.message.content,
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_masks_key() {
        let config = OpenAiCompatibleConfig::new("openai", "sk-1234567890abcdef");
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("1234567890"));
    }

    #[test]
    fn tool_choice_conversion() {
        assert_eq!(to_tool_choice(&ToolChoice::Auto), Some(serde_json::json!("auto")));
        assert_eq!(
            to_tool_choice(&ToolChoice::Tool("lookup".to_string())),
            Some(serde_json::json!({"type": "function", "function": {"name": "lookup"}}))
        );
    }

    #[test]
    fn sanitizes_credential_errors() {
        let sanitized = sanitize_api_error("invalid authorization header");
        assert!(!sanitized.contains("authorization"));
    }
}
