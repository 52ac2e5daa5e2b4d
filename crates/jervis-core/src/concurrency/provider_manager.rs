//! Provider Concurrency Manager (C3): per-provider semaphore with a bypass
//! for non-blocking (CPU-bound local) providers.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use jervis_llm::concurrency::{ConcurrencyManager, ProviderPermit};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Whether a provider's calls should be gated by a semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// CPU-bound local model: calls bypass the semaphore entirely
    NonBlocking,
    /// GPU-bound/remote: calls are gated by the per-provider semaphore
    Interruptible,
}

/// Per-provider configuration for [`ProviderConcurrencyManager`].
#[derive(Debug, Clone, Copy)]
pub struct ProviderLimits {
    /// Semaphore capacity; ignored for `NonBlocking` providers
    pub max_concurrent_requests: usize,
    /// Gating mode
    pub mode: ProviderMode,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            mode: ProviderMode::Interruptible,
        }
    }
}

/// A held semaphore permit, released on drop (covers cancellation and panics
/// since `OwnedSemaphorePermit`'s own `Drop` does the releasing).
pub struct SemaphorePermit(#[allow(dead_code)] OwnedSemaphorePermit);
impl ProviderPermit for SemaphorePermit {}

/// A permit for a `NonBlocking` provider: gates nothing.
pub struct UngatedPermit;
impl ProviderPermit for UngatedPermit {}

/// The Provider Concurrency Manager (C3): one lazily-created semaphore per
/// provider, capacity from configuration.
pub struct ProviderConcurrencyManager {
    limits: HashMap<String, ProviderLimits>,
    default_limits: ProviderLimits,
    semaphores: DashMap<String, Arc<Semaphore>>,
}

impl ProviderConcurrencyManager {
    /// Build a manager from per-provider limits; providers absent from the
    /// map use `default_limits`.
    #[must_use]
    pub fn new(limits: HashMap<String, ProviderLimits>, default_limits: ProviderLimits) -> Self {
        Self {
            limits,
            default_limits,
            semaphores: DashMap::new(),
        }
    }

    fn limits_for(&self, provider: &str) -> ProviderLimits {
        self.limits.get(provider).copied().unwrap_or(self.default_limits)
    }

    fn semaphore_for(&self, provider: &str, capacity: usize) -> Arc<Semaphore> {
        self.semaphores
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(capacity)))
            .clone()
    }
}

#[async_trait::async_trait]
impl ConcurrencyManager for ProviderConcurrencyManager {
    async fn acquire(&self, provider: &str) -> Box<dyn ProviderPermit> {
        let limits = self.limits_for(provider);
        if limits.mode == ProviderMode::NonBlocking {
            return Box::new(UngatedPermit);
        }

        let semaphore = self.semaphore_for(provider, limits.max_concurrent_requests);
        // Semaphore is never closed, so acquiring an owned permit cannot fail.
        let permit = semaphore
            .acquire_owned()
            .await
            .expect("semaphore is never closed");
        Box::new(SemaphorePermit(permit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn non_blocking_provider_never_gates() {
        let mut limits = HashMap::new();
        limits.insert(
            "local".to_string(),
            ProviderLimits {
                max_concurrent_requests: 1,
                mode: ProviderMode::NonBlocking,
            },
        );
        let manager = ProviderConcurrencyManager::new(limits, ProviderLimits::default());
        let _a = manager.acquire("local").await;
        let _b = manager.acquire("local").await;
    }

    #[tokio::test]
    async fn interruptible_provider_caps_in_flight_permits() {
        let mut limits = HashMap::new();
        limits.insert(
            "gpu".to_string(),
            ProviderLimits {
                max_concurrent_requests: 2,
                mode: ProviderMode::Interruptible,
            },
        );
        let manager = Arc::new(ProviderConcurrencyManager::new(limits, ProviderLimits::default()));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let manager = manager.clone();
            let in_flight = in_flight.clone();
            let max_observed = max_observed.clone();
            handles.push(tokio::spawn(async move {
                let _permit = manager.acquire("gpu").await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(max_observed.load(Ordering::SeqCst) <= 2);
    }
}
