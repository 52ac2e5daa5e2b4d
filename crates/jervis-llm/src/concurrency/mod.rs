//! Concurrency seams the Gateway (C5) calls into
//!
//! The Domain Rate Limiter (C2) and Provider Concurrency Manager (C3) are
//! generic network-courtesy primitives shared with the polling framework, so
//! their concrete implementations live in `jervis-core`, which depends on
//! this crate. The gateway only needs the contract, expressed here as
//! object-safe traits, and is handed concrete implementations at
//! construction time.

use std::fmt;

/// Acquires a permit to contact a domain, suspending the caller until one is
/// obtainable (C2 algorithm — phase-based token bucket, private-address bypass)
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Suspend until a request to `url`'s domain may proceed
    async fn acquire(&self, url: &str);
}

/// A permit held for the duration of a provider call. Dropping it releases
/// the underlying semaphore slot (if any) on every exit path, including
/// cancellation.
pub trait ProviderPermit: Send {}

/// Bounds in-flight requests per provider (C3). `NONBLOCKING` providers may
/// choose to hand back a permit that does not actually gate anything.
#[async_trait::async_trait]
pub trait ConcurrencyManager: Send + Sync {
    /// Acquire a permit for `provider`, suspending if its semaphore is saturated
    async fn acquire(&self, provider: &str) -> Box<dyn ProviderPermit>;
}

/// A permit that performs no gating, for providers/tests that don't need one
pub struct NoopPermit;
impl ProviderPermit for NoopPermit {}

/// A [`RateLimiter`] that never delays — useful for tests and for providers
/// reached over a local/private address
#[derive(Debug, Default)]
pub struct NoopRateLimiter;

#[async_trait::async_trait]
impl RateLimiter for NoopRateLimiter {
    async fn acquire(&self, _url: &str) {}
}

/// A [`ConcurrencyManager`] that never gates — useful for tests
#[derive(Debug, Default)]
pub struct NoopConcurrencyManager;

#[async_trait::async_trait]
impl ConcurrencyManager for NoopConcurrencyManager {
    async fn acquire(&self, _provider: &str) -> Box<dyn ProviderPermit> {
        Box::new(NoopPermit)
    }
}

impl fmt::Debug for NoopPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NoopPermit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_rate_limiter_does_not_block() {
        NoopRateLimiter.acquire("https://example.com").await;
    }

    #[tokio::test]
    async fn noop_concurrency_manager_grants_immediately() {
        let _permit = NoopConcurrencyManager.acquire("openai").await;
    }
}
