//! Adaptive per-domain rate limiter.
//!
//! Tracks request timing per domain and adapts delays based on
//! responses. Every request waits the base delay plus a random jitter
//! (the polite 2-3.5 s pacing dealer and manufacturer sites tolerate),
//! backs off multiplicatively on 403/429/503, and gradually recovers
//! after consecutive successes. Domain state can be persisted between
//! runs so a site that forced a backoff is still approached carefully
//! on the next invocation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Rate limiter tuning.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Minimum delay between requests to one domain.
    pub base_delay: Duration,
    /// Random extra delay added on top of the base.
    pub max_jitter: Duration,
    /// Delay multiplier applied on throttling responses.
    pub backoff_multiplier: f64,
    /// Ceiling for the backed-off delay.
    pub max_delay: Duration,
    /// Consecutive successes required to leave backoff.
    pub recovery_threshold: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::from_millis(1500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            recovery_threshold: 3,
        }
    }
}

impl RateLimitConfig {
    /// Config with a site-specific pacing band.
    pub fn with_delays(min_delay_secs: f64, max_jitter_secs: f64) -> Self {
        Self {
            base_delay: Duration::from_secs_f64(min_delay_secs.max(0.0)),
            max_jitter: Duration::from_secs_f64(max_jitter_secs.max(0.0)),
            ..Self::default()
        }
    }
}

/// Pacing state for one domain.
#[derive(Debug, Clone)]
struct DomainState {
    current_delay: Duration,
    last_request: Option<Instant>,
    consecutive_successes: u32,
    in_backoff: bool,
}

impl DomainState {
    fn new(base_delay: Duration) -> Self {
        Self {
            current_delay: base_delay,
            last_request: None,
            consecutive_successes: 0,
            in_backoff: false,
        }
    }

    fn time_until_ready(&self, jitter: Duration) -> Duration {
        match self.last_request {
            None => Duration::ZERO,
            Some(last) => {
                let target = self.current_delay + jitter;
                let elapsed = last.elapsed();
                target.saturating_sub(elapsed)
            }
        }
    }
}

/// Persisted form of a domain's pacing state.
#[derive(Debug, Serialize, Deserialize)]
struct DomainSnapshot {
    delay_ms: u64,
    in_backoff: bool,
}

/// Adaptive rate limiter shared by every client talking to one source.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    domains: Arc<RwLock<HashMap<String, DomainState>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Create a new rate limiter with default config.
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a new rate limiter with custom config.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            domains: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Extract domain from URL.
    pub fn extract_domain(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|s| s.to_string()))
    }

    /// Random jitter inside the configured band, derived from the clock.
    fn jitter(&self) -> Duration {
        let max_ms = self.config.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0);
        Duration::from_millis(nanos % (max_ms + 1))
    }

    /// Wait until the domain is ready, then mark the request as started.
    /// Returns the domain for later success/failure reporting.
    pub async fn acquire(&self, url: &str) -> Option<String> {
        let domain = Self::extract_domain(url)?;
        let jitter = self.jitter();

        let wait_time = {
            let domains = self.domains.read().await;
            domains
                .get(&domain)
                .map(|s| s.time_until_ready(jitter))
                .unwrap_or(Duration::ZERO)
        };

        if wait_time > Duration::ZERO {
            debug!("Rate limiting {}: waiting {:?}", domain, wait_time);
            tokio::time::sleep(wait_time).await;
        }

        {
            let mut domains = self.domains.write().await;
            let state = domains
                .entry(domain.clone())
                .or_insert_with(|| DomainState::new(self.config.base_delay));
            state.last_request = Some(Instant::now());
        }

        Some(domain)
    }

    /// Report a successful request - may recover from backoff.
    pub async fn report_success(&self, domain: &str) {
        let mut domains = self.domains.write().await;
        if let Some(state) = domains.get_mut(domain) {
            state.consecutive_successes += 1;
            if state.in_backoff && state.consecutive_successes >= self.config.recovery_threshold {
                state.in_backoff = false;
                state.current_delay = self.config.base_delay;
                info!("Recovered from backoff for {}", domain);
            }
        }
    }

    /// Report a throttling response (403/429/503) - increases the delay.
    pub async fn report_throttled(&self, domain: &str) {
        let mut domains = self.domains.write().await;
        let state = domains
            .entry(domain.to_string())
            .or_insert_with(|| DomainState::new(self.config.base_delay));
        state.consecutive_successes = 0;
        state.in_backoff = true;
        let next = state.current_delay.mul_f64(self.config.backoff_multiplier);
        state.current_delay = next.min(self.config.max_delay);
        warn!(
            "Backing off {} to {:?} after throttling response",
            domain, state.current_delay
        );
    }

    /// Current delay before the next request to a domain would start.
    pub async fn current_delay(&self, domain: &str) -> Duration {
        let domains = self.domains.read().await;
        domains
            .get(domain)
            .map(|s| s.current_delay)
            .unwrap_or(self.config.base_delay)
    }

    async fn snapshot(&self) -> HashMap<String, DomainSnapshot> {
        let domains = self.domains.read().await;
        domains
            .iter()
            .map(|(domain, state)| {
                (
                    domain.clone(),
                    DomainSnapshot {
                        delay_ms: state.current_delay.as_millis() as u64,
                        in_backoff: state.in_backoff,
                    },
                )
            })
            .collect()
    }

    async fn restore(&self, snapshot: HashMap<String, DomainSnapshot>) {
        let mut domains = self.domains.write().await;
        for (domain, saved) in snapshot {
            let state = domains
                .entry(domain)
                .or_insert_with(|| DomainState::new(self.config.base_delay));
            state.current_delay = Duration::from_millis(saved.delay_ms).max(self.config.base_delay);
            state.in_backoff = saved.in_backoff;
        }
    }
}

/// Persist limiter state to a JSON file.
pub async fn save_rate_limit_state(limiter: &RateLimiter, path: &Path) -> anyhow::Result<()> {
    let snapshot = limiter.snapshot().await;
    if snapshot.is_empty() {
        return Ok(());
    }
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json)?;
    debug!("Saved rate limit state for {} domains", snapshot.len());
    Ok(())
}

/// Load previously persisted limiter state, if any.
pub async fn load_rate_limit_state(limiter: &RateLimiter, path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let json = std::fs::read_to_string(path)?;
    let snapshot: HashMap<String, DomainSnapshot> = serde_json::from_str(&json)?;
    let count = snapshot.len();
    limiter.restore(snapshot).await;
    debug!("Restored rate limit state for {} domains", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            RateLimiter::extract_domain("https://example.com/models/a"),
            Some("example.com".to_string())
        );
        assert_eq!(RateLimiter::extract_domain("not a url"), None);
    }

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        let domain = limiter.acquire("https://example.com/a").await;
        assert_eq!(domain.as_deref(), Some("example.com"));
        assert!(start.elapsed() < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_backoff_and_recovery() {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            recovery_threshold: 2,
        });
        limiter.acquire("https://example.com/a").await;

        limiter.report_throttled("example.com").await;
        let backed_off = limiter.current_delay("example.com").await;
        assert!(backed_off >= Duration::from_millis(2));

        limiter.report_success("example.com").await;
        limiter.report_success("example.com").await;
        assert_eq!(
            limiter.current_delay("example.com").await,
            Duration::from_millis(1)
        );
    }

    #[tokio::test]
    async fn test_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rate_limits.json");

        let limiter = RateLimiter::new();
        limiter.acquire("https://example.com/a").await;
        limiter.report_throttled("example.com").await;
        save_rate_limit_state(&limiter, &path).await.unwrap();

        let restored = RateLimiter::new();
        load_rate_limit_state(&restored, &path).await.unwrap();
        assert!(restored.current_delay("example.com").await > Duration::from_secs(2));
    }
}
