//! Wires every collaborator cataloged in [`crate::state::AppState`] into a
//! running set, in the order each one's constructor requires: gating (C2/C3)
//! before the gateway (C5), the gateway before the planner/executor (C9/C10),
//! the item store (C8) before the connector sources that feed it (C7).

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use jervis_core::concurrency::{DomainRateLimiter, ProviderConcurrencyManager, ProviderLimits, ProviderMode};
use jervis_core::dialog::DialogCoordinator;
use jervis_core::event_bus::EventBus;
use jervis_core::executor::{ExecutorConfig, PlanExecutor};
use jervis_core::memory::{MemoryStore, RedisStore, SessionStore};
use jervis_core::planner::{Planner, ToolCatalog, ToolCatalogEntry};
use jervis_core::tool_registry::ToolRegistry;
use jervis_llm::candidate_selector::ModelType;
use jervis_llm::concurrency::{ConcurrencyManager, RateLimiter};
use jervis_llm::gateway::{Gateway, GatewayConfig};
use jervis_llm::provider::LlmProvider;
use jervis_llm::providers::anthropic::{AnthropicConfig, AnthropicProvider};
use jervis_llm::providers::openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use jervis_memory::{HttpHybridStore, HybridStore, ItemStore};
use jervis_tools::registry::JervisToolRegistry;

use crate::config::AppConfig;
use crate::connectors::{build_connections, spawn_polling_loop};
use crate::item_sink::ItemStoreSink;
use crate::prompts::build_prompt_registry;
use crate::state::AppState;

fn build_provider(config: &crate::config::ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.kind.as_str() {
        "anthropic" => {
            let mut anthropic_config = AnthropicConfig::new(config.api_key.clone());
            if let Some(base_url) = &config.base_url {
                anthropic_config = anthropic_config.with_base_url(base_url.clone());
            }
            Ok(Arc::new(AnthropicProvider::new(anthropic_config)?))
        }
        "openai_compatible" => {
            let mut openai_config = OpenAiCompatibleConfig::new(config.name.clone(), config.api_key.clone());
            if let Some(base_url) = &config.base_url {
                openai_config = openai_config.with_base_url(base_url.clone());
            }
            Ok(Arc::new(OpenAiCompatibleProvider::new(openai_config)?))
        }
        other => anyhow::bail!("unknown provider kind: {other}"),
    }
}

fn build_gateway(config: &AppConfig) -> Result<Arc<Gateway>> {
    let mut gateway_config = GatewayConfig::new();
    gateway_config.prompts = build_prompt_registry();

    for provider_config in &config.providers {
        let provider = build_provider(provider_config)
            .with_context(|| format!("failed to build provider {}", provider_config.name))?;
        let endpoint = provider_config
            .base_url
            .clone()
            .unwrap_or_else(|| provider_config.name.clone());
        gateway_config = gateway_config.with_provider(provider, endpoint);
    }

    for model_config in &config.models {
        gateway_config = gateway_config.with_model(jervis_llm::candidate_selector::ModelDescriptor {
            provider: model_config.provider.clone(),
            model: model_config.model.clone(),
            model_type: ModelType::new(model_config.model_type.clone()),
            quick: model_config.quick,
            context_length: model_config.context_length,
            output_budget: model_config.output_budget,
        });
    }

    let rate_limiter: Arc<dyn RateLimiter> =
        Arc::new(DomainRateLimiter::new(config.rate_limiter.clone().into_rate_limiter_config()));

    let mut provider_limits: HashMap<String, ProviderLimits> = HashMap::new();
    for provider_config in &config.providers {
        provider_limits.insert(
            provider_config.name.clone(),
            ProviderLimits {
                max_concurrent_requests: provider_config.max_concurrent_requests,
                mode: if provider_config.non_blocking {
                    ProviderMode::NonBlocking
                } else {
                    ProviderMode::Interruptible
                },
            },
        );
    }
    let default_limits = ProviderLimits {
        max_concurrent_requests: 4,
        mode: ProviderMode::Interruptible,
    };
    let concurrency: Arc<dyn ConcurrencyManager> =
        Arc::new(ProviderConcurrencyManager::new(provider_limits, default_limits));

    Ok(Arc::new(Gateway::new(gateway_config, rate_limiter, concurrency)))
}

async fn build_session_store(config: &crate::config::SessionSettings) -> Result<Arc<dyn SessionStore>> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisStore::new(url, config.key_prefix.clone(), config.ttl_secs)
                .context("failed to connect session store to redis")?;
            Ok(Arc::new(store))
        }
        None => {
            info!("no session redis_url configured, using in-process session store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Build every collaborator and start background tasks (the connector poll
/// loop). Returns the shared state handlers are extended with.
pub async fn bootstrap(config: AppConfig) -> Result<AppState> {
    let gateway = build_gateway(&config)?;

    let event_bus = Arc::new(EventBus::new(config.server.event_bus_capacity));
    let dialog = Arc::new(DialogCoordinator::new());

    let tool_registry = Arc::new(JervisToolRegistry::with_builtins(gateway.clone()));
    let catalog_entries: Vec<ToolCatalogEntry> = tool_registry.catalog();
    let catalog = ToolCatalog::new(catalog_entries, "analysis_reasoning");

    let planner = Arc::new(Planner::new(gateway.clone(), catalog));
    let tools_for_executor: Arc<dyn ToolRegistry> = tool_registry.clone();
    let executor = Arc::new(PlanExecutor::new(
        gateway.clone(),
        tools_for_executor,
        event_bus.clone(),
        ExecutorConfig {
            max_parallelism: config.executor.max_parallelism,
            max_recovery_attempts: config.executor.max_recovery_attempts,
        },
    ));

    let item_store = Arc::new(
        ItemStore::from_path(std::path::Path::new(&config.memory.item_store_path))
            .await
            .context("failed to open item store")?,
    );

    let sink = Arc::new(ItemStoreSink::new(item_store.clone()));
    let connections = build_connections(&config.connectors.connections)?;
    spawn_polling_loop(connections, sink, config.connectors.poll_interval_secs);

    let hybrid_store: Arc<dyn HybridStore> = Arc::new(HttpHybridStore::new(
        reqwest::Client::new(),
        config.memory.hybrid_store_url.clone(),
    ));

    let sessions = build_session_store(&config.sessions).await?;

    Ok(AppState {
        gateway,
        planner,
        executor,
        event_bus,
        dialog,
        item_store,
        hybrid_store,
        sessions,
        config: Arc::new(config),
    })
}
