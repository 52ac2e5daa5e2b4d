//! Domain Rate Limiter (C2): adaptive per-domain token-bucket gating.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use jervis_llm::concurrency::RateLimiter;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Which burst phase a domain has graduated into, by cumulative request count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Burst,
    Normal,
    Sustained,
}

impl Phase {
    fn capacity_per_sec(self, config: &RateLimiterConfig) -> u32 {
        match self {
            Phase::Burst => config.burst_capacity_per_sec,
            Phase::Normal => config.normal_capacity_per_sec,
            Phase::Sustained => config.sustained_capacity_per_sec,
        }
    }

    fn delay(self, config: &RateLimiterConfig) -> Duration {
        match self {
            Phase::Burst => config.d1,
            Phase::Normal => config.d2,
            Phase::Sustained => config.d3,
        }
    }
}

/// Thresholds and per-phase capacities/delays for [`DomainRateLimiter`].
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Cumulative request count at which a domain graduates burst → normal
    pub t1: u64,
    /// Cumulative request count at which a domain graduates normal → sustained
    pub t2: u64,
    /// Unconditional spacing delay applied in the burst phase
    pub d1: Duration,
    /// Unconditional spacing delay applied in the normal phase
    pub d2: Duration,
    /// Unconditional spacing delay applied in the sustained phase
    pub d3: Duration,
    /// Token bucket capacity (tokens/sec) in the burst phase
    pub burst_capacity_per_sec: u32,
    /// Token bucket capacity (tokens/sec) in the normal phase
    pub normal_capacity_per_sec: u32,
    /// Token bucket capacity (tokens/sec) in the sustained phase
    pub sustained_capacity_per_sec: u32,
    /// Hostname prefixes treated as private/internal regardless of IP shape
    pub internal_prefixes: Vec<String>,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            t1: 100,
            t2: 500,
            d1: Duration::ZERO,
            d2: Duration::from_millis(100),
            d3: Duration::from_millis(500),
            burst_capacity_per_sec: 100,
            normal_capacity_per_sec: 10,
            sustained_capacity_per_sec: 1,
            internal_prefixes: Vec::new(),
        }
    }
}

struct Bucket {
    capacity_per_sec: u32,
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity_per_sec: u32) -> Self {
        Self {
            capacity_per_sec,
            tokens: capacity_per_sec as f64,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, capacity_per_sec: u32) {
        if capacity_per_sec != self.capacity_per_sec {
            self.capacity_per_sec = capacity_per_sec;
            self.tokens = self.tokens.min(capacity_per_sec as f64);
        }
        let elapsed = self.last_refill.elapsed().as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.capacity_per_sec as f64)
            .min(self.capacity_per_sec as f64);
        self.last_refill = Instant::now();
    }

    /// Try to take one token; returns the wait needed if the bucket is empty.
    fn try_take(&mut self) -> Option<Duration> {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let nanos_to_refill = (1.0 - self.tokens) / self.capacity_per_sec as f64;
            Some(Duration::from_secs_f64(nanos_to_refill))
        }
    }
}

struct DomainState {
    item_count: AtomicU64,
    bucket: Mutex<Bucket>,
    phase: Mutex<Phase>,
}

/// The Domain Rate Limiter (C2): per-domain phase-based token bucket, with a
/// bypass for private/loopback addresses.
pub struct DomainRateLimiter {
    config: RateLimiterConfig,
    domains: DashMap<String, DomainState>,
}

impl DomainRateLimiter {
    /// Build a limiter from its phase thresholds/capacities.
    #[must_use]
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            domains: DashMap::new(),
        }
    }

    /// Drop all accumulated state for a domain (admin operation).
    pub fn reset(&self, domain: &str) {
        self.domains.remove(domain);
    }

    fn phase_for_count(&self, count: u64) -> Phase {
        if count <= self.config.t1 {
            Phase::Burst
        } else if count <= self.config.t2 {
            Phase::Normal
        } else {
            Phase::Sustained
        }
    }
}

/// Extract the domain (host) from a URL, if parseable.
fn parse_domain(url: &str) -> Option<String> {
    ::url::Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// Whether `host` is a loopback/private address exempt from rate limiting.
fn is_private_address(host: &str, internal_prefixes: &[String]) -> bool {
    if host == "localhost" || host == "::1" || host.starts_with("127.") {
        return true;
    }
    if internal_prefixes.iter().any(|p| host.starts_with(p.as_str())) {
        return true;
    }
    let octets: Vec<&str> = host.split('.').collect();
    if octets.len() == 4 {
        if let Ok(parts) = octets
            .iter()
            .map(|o| o.parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
        {
            let [a, b, ..] = parts[..] else { return false };
            if a == 10 {
                return true;
            }
            if a == 192 && b == 168 {
                return true;
            }
            if a == 172 && (16..=31).contains(&b) {
                return true;
            }
        }
    }
    false
}

#[async_trait::async_trait]
impl RateLimiter for DomainRateLimiter {
    async fn acquire(&self, url: &str) {
        let Some(domain) = parse_domain(url) else {
            warn!(url, "could not parse domain, skipping rate limit");
            return;
        };

        if is_private_address(&domain, &self.config.internal_prefixes) {
            return;
        }

        let count = {
            let entry = self.domains.entry(domain.clone()).or_insert_with(|| DomainState {
                item_count: AtomicU64::new(0),
                bucket: Mutex::new(Bucket::new(self.config.burst_capacity_per_sec)),
                phase: Mutex::new(Phase::Burst),
            });
            entry.item_count.fetch_add(1, Ordering::SeqCst) + 1
        };

        let phase = self.phase_for_count(count);
        {
            let entry = self.domains.get(&domain).expect("just inserted");
            let mut current_phase = entry.phase.lock().await;
            if *current_phase != phase {
                debug!(domain, ?phase, "rate limiter phase transition");
                *current_phase = phase;
            }
        }

        let delay = phase.delay(&self.config);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        loop {
            let wait = {
                let entry = self.domains.get(&domain).expect("just inserted");
                let mut bucket = entry.bucket.lock().await;
                bucket.refill(phase.capacity_per_sec(&self.config));
                bucket.try_take()
            };
            match wait {
                None => break,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn private_addresses_bypass_immediately() {
        let limiter = DomainRateLimiter::new(RateLimiterConfig::default());
        let start = Instant::now();
        limiter.acquire("http://192.168.1.10/api").await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn localhost_bypasses() {
        let limiter = DomainRateLimiter::new(RateLimiterConfig::default());
        let start = Instant::now();
        limiter.acquire("http://127.0.0.1:8080/x").await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn unparseable_url_does_not_rate_limit() {
        let limiter = DomainRateLimiter::new(RateLimiterConfig::default());
        let start = Instant::now();
        limiter.acquire("not a url").await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn phase_transition_applies_increasing_delay() {
        // t1/t2 deliberately differ: the Normal phase's range is (t1, t2],
        // which is empty when t1 == t2 (see DESIGN.md's rate limiter entry).
        let config = RateLimiterConfig {
            t1: 2,
            t2: 4,
            d1: Duration::ZERO,
            d2: Duration::from_millis(80),
            d3: Duration::from_millis(200),
            ..RateLimiterConfig::default()
        };
        let limiter = DomainRateLimiter::new(config);
        let url = "https://api.example.com/x";

        for _ in 0..2 {
            let start = Instant::now();
            limiter.acquire(url).await;
            assert!(start.elapsed() < Duration::from_millis(30));
        }

        let start = Instant::now();
        limiter.acquire(url).await;
        assert!(start.elapsed() >= Duration::from_millis(70));
    }

    #[test]
    fn classifies_rfc1918_ranges() {
        assert!(is_private_address("10.0.0.5", &[]));
        assert!(is_private_address("192.168.1.1", &[]));
        assert!(is_private_address("172.20.0.1", &[]));
        assert!(!is_private_address("172.15.0.1", &[]));
        assert!(!is_private_address("8.8.8.8", &[]));
    }
}
