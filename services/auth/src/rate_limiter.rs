//! Rate limiter for slowing down credential stuffing on login/register

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed per window
    pub max_attempts: u32,
    /// Window length
    pub window: Duration,
    /// Key clients by the first `X-Forwarded-For` hop instead of the socket
    /// address. Only enable behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(15 * 60),
            trust_forwarded_for: false,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new RateLimiterConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_RATE_LIMIT_MAX`: attempts per window (default: 10)
    /// - `AUTH_RATE_LIMIT_WINDOW_SECS`: window length in seconds (default: 900)
    /// - `AUTH_RATE_LIMIT_TRUST_PROXY`: key by `X-Forwarded-For` (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_attempts = std::env::var("AUTH_RATE_LIMIT_MAX")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_attempts);

        let window = std::env::var("AUTH_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.window);

        let trust_forwarded_for = std::env::var("AUTH_RATE_LIMIT_TRUST_PROXY")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Self {
            max_attempts,
            window,
            trust_forwarded_for,
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    started: Instant,
    attempts: u32,
}

/// Fixed-window rate limiter keyed by client
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count an attempt for `key` and decide whether it may proceed
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut entries = self.entries.lock().await;

        let window = entries.entry(key.to_string()).or_insert(Window {
            started: now,
            attempts: 0,
        });

        if now.duration_since(window.started) >= self.config.window {
            window.started = now;
            window.attempts = 0;
        }

        if window.attempts >= self.config.max_attempts {
            let retry_after = self
                .config
                .window
                .saturating_sub(now.duration_since(window.started));
            warn!("Rate limit exceeded for {}", key);
            return RateLimitDecision::Limited { retry_after };
        }

        window.attempts += 1;
        RateLimitDecision::Allowed {
            remaining: self.config.max_attempts - window.attempts,
        }
    }

    /// Forget windows that have run out; returns how many were dropped
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    async fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, window| now.duration_since(window.started) < self.config.window);
        let purged = before - entries.len();
        if purged > 0 {
            info!("Purged {} expired rate limit windows", purged);
        }
        purged
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window: Duration::from_secs(window_secs),
            trust_forwarded_for: false,
        })
    }

    #[test]
    #[serial_test::serial]
    fn config_from_env() {
        unsafe {
            std::env::set_var("AUTH_RATE_LIMIT_MAX", "3");
            std::env::set_var("AUTH_RATE_LIMIT_WINDOW_SECS", "120");
            std::env::set_var("AUTH_RATE_LIMIT_TRUST_PROXY", "true");
        }

        let config = RateLimiterConfig::from_env();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.window, Duration::from_secs(120));
        assert!(config.trust_forwarded_for);

        unsafe {
            std::env::remove_var("AUTH_RATE_LIMIT_MAX");
            std::env::remove_var("AUTH_RATE_LIMIT_WINDOW_SECS");
            std::env::remove_var("AUTH_RATE_LIMIT_TRUST_PROXY");
        }

        let config = RateLimiterConfig::from_env();
        assert_eq!(config.max_attempts, 10);
        assert!(!config.trust_forwarded_for);
    }

    #[tokio::test]
    async fn allows_up_to_the_limit() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        assert_eq!(
            limiter.check_at("ip", now).await,
            RateLimitDecision::Allowed { remaining: 2 }
        );
        limiter.check_at("ip", now).await;
        assert_eq!(
            limiter.check_at("ip", now).await,
            RateLimitDecision::Allowed { remaining: 0 }
        );
        assert!(matches!(
            limiter.check_at("ip", now).await,
            RateLimitDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(matches!(
            limiter.check_at("a", now).await,
            RateLimitDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_at("b", now).await,
            RateLimitDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_at("a", now).await,
            RateLimitDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn window_resets_and_reports_retry_after() {
        let limiter = limiter(1, 60);
        let start = Instant::now();

        limiter.check_at("ip", start).await;
        match limiter.check_at("ip", start + Duration::from_secs(20)).await {
            RateLimitDecision::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(40))
            }
            other => panic!("expected limit, got {:?}", other),
        }

        assert!(matches!(
            limiter.check_at("ip", start + Duration::from_secs(61)).await,
            RateLimitDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn purge_drops_only_stale_windows() {
        let limiter = limiter(5, 60);
        let start = Instant::now();

        limiter.check_at("old", start).await;
        limiter.check_at("fresh", start + Duration::from_secs(50)).await;

        assert_eq!(
            limiter.purge_expired_at(start + Duration::from_secs(70)).await,
            1
        );
        assert_eq!(limiter.entries.lock().await.len(), 1);
    }
}
