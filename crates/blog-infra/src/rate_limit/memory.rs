//! In-memory rate limiter using governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};

use blog_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window and client.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    fn quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.max_requests).unwrap_or(NonZeroU32::MIN);

        Quota::with_period(self.window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst)
    }
}

/// Per-key GCRA rate limiter.
///
/// Limits are per-process, not distributed across instances.
pub struct InMemoryRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: DefaultKeyedRateLimiter::keyed(config.quota()),
            clock: DefaultClock::default(),
        }
    }

    pub fn from_env() -> Self {
        let defaults = RateLimitConfig::default();
        let config = RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        };
        Self::new(config)
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        let key = key.to_string();

        let result = match self.limiter.check_key(&key) {
            Ok(()) => RateLimitResult {
                allowed: true,
                reset_after: Duration::ZERO,
            },
            Err(not_until) => RateLimitResult {
                allowed: false,
                reset_after: not_until.wait_time_from(self.clock.now()),
            },
        };

        // Forget idle clients so the key map does not grow without bound
        if self.limiter.len() > 10_000 {
            self.limiter.retain_recent();
        }

        Ok(result)
    }
}
