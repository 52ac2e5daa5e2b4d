//! Concrete implementations of the Domain Rate Limiter (C2) and Provider
//! Concurrency Manager (C3), wired into `jervis-llm`'s `Gateway` as
//! injected trait objects so that leaf crate stays free of this crate's
//! dependency on `dashmap`/`url`.

mod provider_manager;
mod rate_limiter;

pub use provider_manager::{ProviderConcurrencyManager, ProviderLimits, ProviderMode};
pub use rate_limiter::{DomainRateLimiter, RateLimiterConfig};
