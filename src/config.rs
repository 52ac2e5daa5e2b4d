//! Application configuration: environment + optional TOML file, layered
//! through the `config` crate the way the rest of this workspace's ambient
//! stack expects.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One configured LLM provider endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Provider name used for gateway routing ("openai", "openrouter", "anthropic", ...)
    pub name: String,
    /// Which backend this provider is: "openai_compatible" or "anthropic"
    pub kind: String,
    /// API key; empty for endpoints that need none
    #[serde(default)]
    pub api_key: String,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Semaphore capacity for this provider's concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Whether this provider's calls bypass the concurrency semaphore entirely
    #[serde(default)]
    pub non_blocking: bool,
}

fn default_max_concurrent() -> usize {
    4
}

/// One entry in the model catalog the candidate selector draws from.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Provider this model is served by; must match a [`ProviderConfig::name`]
    pub provider: String,
    /// Model identifier passed to the provider
    pub model: String,
    /// Model type this entry serves: "planning", "tool_reasoning",
    /// "synthesis", "finalizer", or "recovery_reasoning"
    pub model_type: String,
    /// Whether this model is flagged for quick/cheap preference
    #[serde(default)]
    pub quick: bool,
    /// Maximum context length in tokens
    pub context_length: u32,
    /// Output token budget used as `max_tokens`
    #[serde(default = "default_output_budget")]
    pub output_budget: u32,
}

fn default_output_budget() -> u32 {
    4096
}

/// Domain rate limiter phase thresholds and capacities (C2).
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimiterSettings {
    /// Cumulative request count at which burst -> normal
    #[serde(default = "default_t1")]
    pub t1: u64,
    /// Cumulative request count at which normal -> sustained
    #[serde(default = "default_t2")]
    pub t2: u64,
    /// Unconditional spacing delay in the burst phase, milliseconds
    #[serde(default)]
    pub d1_ms: u64,
    /// Unconditional spacing delay in the normal phase, milliseconds
    #[serde(default = "default_d2_ms")]
    pub d2_ms: u64,
    /// Unconditional spacing delay in the sustained phase, milliseconds
    #[serde(default = "default_d3_ms")]
    pub d3_ms: u64,
    /// Token bucket capacity, burst phase
    #[serde(default = "default_burst_capacity")]
    pub burst_capacity_per_sec: u32,
    /// Token bucket capacity, normal phase
    #[serde(default = "default_normal_capacity")]
    pub normal_capacity_per_sec: u32,
    /// Token bucket capacity, sustained phase
    #[serde(default = "default_sustained_capacity")]
    pub sustained_capacity_per_sec: u32,
    /// Hostname prefixes treated as private regardless of IP shape
    #[serde(default)]
    pub internal_prefixes: Vec<String>,
}

fn default_t1() -> u64 {
    100
}
fn default_t2() -> u64 {
    500
}
fn default_d2_ms() -> u64 {
    100
}
fn default_d3_ms() -> u64 {
    500
}
fn default_burst_capacity() -> u32 {
    100
}
fn default_normal_capacity() -> u32 {
    10
}
fn default_sustained_capacity() -> u32 {
    1
}

impl Default for RateLimiterSettings {
    fn default() -> Self {
        Self {
            t1: default_t1(),
            t2: default_t2(),
            d1_ms: 0,
            d2_ms: default_d2_ms(),
            d3_ms: default_d3_ms(),
            burst_capacity_per_sec: default_burst_capacity(),
            normal_capacity_per_sec: default_normal_capacity(),
            sustained_capacity_per_sec: default_sustained_capacity(),
            internal_prefixes: Vec::new(),
        }
    }
}

impl RateLimiterSettings {
    /// Translate into the concurrency crate's runtime config.
    #[must_use]
    pub fn into_rate_limiter_config(self) -> jervis_core::concurrency::RateLimiterConfig {
        jervis_core::concurrency::RateLimiterConfig {
            t1: self.t1,
            t2: self.t2,
            d1: Duration::from_millis(self.d1_ms),
            d2: Duration::from_millis(self.d2_ms),
            d3: Duration::from_millis(self.d3_ms),
            burst_capacity_per_sec: self.burst_capacity_per_sec,
            normal_capacity_per_sec: self.normal_capacity_per_sec,
            sustained_capacity_per_sec: self.sustained_capacity_per_sec,
            internal_prefixes: self.internal_prefixes,
        }
    }
}

/// Plan executor tunables (C10).
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSettings {
    /// Maximum ready steps run concurrently per plan
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,
    /// Consecutive recovery attempts for the same step before the plan fails
    #[serde(default = "default_max_recovery_attempts")]
    pub max_recovery_attempts: u32,
}

fn default_max_parallelism() -> usize {
    4
}
fn default_max_recovery_attempts() -> u32 {
    3
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            max_recovery_attempts: default_max_recovery_attempts(),
        }
    }
}

/// Indexing/retrieval settings (C6/C8).
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySettings {
    /// Path to the indexed-item SQLite database
    #[serde(default = "default_item_store_path")]
    pub item_store_path: String,
    /// Base URL of the hybrid (keyword + vector) search service
    #[serde(default = "default_hybrid_store_url")]
    pub hybrid_store_url: String,
    /// Minimum score cutoff applied to hybrid search results
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// Max chunks returned per hybrid search call
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_item_store_path() -> String {
    "data/jervis-items.db".to_string()
}
fn default_hybrid_store_url() -> String {
    "http://localhost:8090".to_string()
}
fn default_min_score() -> f32 {
    0.0
}
fn default_search_limit() -> u32 {
    10
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            item_store_path: default_item_store_path(),
            hybrid_store_url: default_hybrid_store_url(),
            min_score: default_min_score(),
            search_limit: default_search_limit(),
        }
    }
}

/// Session storage settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SessionSettings {
    /// Redis URL; when absent, sessions live in an in-process `MemoryStore`
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Key prefix sessions are namespaced under in Redis
    #[serde(default = "default_session_prefix")]
    pub key_prefix: String,
    /// Inactivity TTL, seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

fn default_session_prefix() -> String {
    "jervis:session".to_string()
}
fn default_session_ttl() -> u64 {
    86_400
}

/// One pre-configured external connection polled by the connector framework (C7).
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Which provider this connection talks to: "atlassian", "gitlab", "email"
    pub provider: String,
    /// Provider base URL
    pub base_url: String,
    /// GitLab project id/path; required when `provider = "gitlab"`
    #[serde(default)]
    pub project_id: Option<String>,
    /// Bearer token, when the provider needs one
    #[serde(default)]
    pub token: Option<String>,
    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout, milliseconds
    #[serde(default = "default_connection_timeout_ms")]
    pub timeout_ms: u64,
    /// Owning client, as a 24-character hex object id. When absent a fresh
    /// id is minted at bootstrap, scoping the connection to an ad hoc
    /// single-tenant client.
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

/// Connector polling settings (C7).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConnectorSettings {
    /// Seconds between poll sweeps of every configured connection
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Connections to poll
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

fn default_poll_interval_secs() -> u64 {
    60
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Event bus channel capacity (C12)
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_event_bus_capacity() -> usize {
    256
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP/WS bind settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Configured LLM providers
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Model catalog
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    /// Domain rate limiter tuning (C2)
    #[serde(default)]
    pub rate_limiter: RateLimiterSettings,
    /// Plan executor tuning (C10)
    #[serde(default)]
    pub executor: ExecutorSettings,
    /// Indexing/retrieval settings (C6/C8)
    #[serde(default)]
    pub memory: MemorySettings,
    /// Session storage settings
    #[serde(default)]
    pub sessions: SessionSettings,
    /// Connector polling settings (C7)
    #[serde(default)]
    pub connectors: ConnectorSettings,
}

impl AppConfig {
    /// Load configuration from (in ascending priority) a bundled default, an
    /// optional TOML file named by `JERVIS_CONFIG` (default `config.toml` in
    /// the working directory, ignored if absent), and `JERVIS_`-prefixed
    /// environment variables with `__` as the nesting separator.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("JERVIS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix("JERVIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to build configuration layers")?;

        config
            .try_deserialize()
            .context("failed to deserialize application configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_settings_default_matches_phase_thresholds() {
        let settings = RateLimiterSettings::default();
        assert_eq!(settings.t1, 100);
        assert_eq!(settings.t2, 500);
        assert!(settings.d1_ms < settings.d2_ms);
        assert!(settings.d2_ms < settings.d3_ms);
    }

    #[test]
    fn rate_limiter_settings_convert_into_runtime_config() {
        let settings = RateLimiterSettings::default();
        let runtime = settings.clone().into_rate_limiter_config();
        assert_eq!(runtime.t1, settings.t1);
        assert_eq!(runtime.d2, Duration::from_millis(settings.d2_ms));
    }

    #[test]
    fn executor_settings_defaults_are_nonzero() {
        let settings = ExecutorSettings::default();
        assert!(settings.max_parallelism > 0);
        assert!(settings.max_recovery_attempts > 0);
    }
}
