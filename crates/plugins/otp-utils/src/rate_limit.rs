//! Fixed-window throttling for code issuance.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Configuration for rate limiting.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed within the time window.
    pub max_requests: u32,
    /// Time window duration.
    pub time_window: Duration,
    /// Whether rate limiting is enabled.
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RateLimitConfig {
    /// Creates a new rate limit config.
    pub fn new(max_requests: u32, time_window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            time_window,
            enabled: true,
        }
    }

    /// Disables rate limiting.
    pub fn disabled() -> Self {
        Self {
            max_requests: u32::MAX,
            time_window: Duration::minutes(1),
            enabled: false,
        }
    }

    /// Creates a config for OTP sending (3 per 5 minutes).
    pub fn for_otp_send() -> Self {
        Self::new(3, Duration::minutes(5))
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed.
    Allowed {
        /// Remaining requests in the current window.
        remaining: u32,
    },
    /// Request is rate limited.
    Limited {
        /// When the rate limit resets.
        reset_at: DateTime<Utc>,
        /// Whole seconds to wait before retrying, rounded up.
        retry_after_seconds: u64,
    },
}

impl RateLimitResult {
    /// Returns true if the request is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    /// Returns true if the request is rate limited.
    pub fn is_limited(&self) -> bool {
        matches!(self, RateLimitResult::Limited { .. })
    }
}

#[derive(Debug, Clone)]
struct Window {
    request_count: u32,
    window_start: DateTime<Utc>,
}

/// In-memory fixed-window rate limiter keyed by phone number.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: HashMap<String, Window>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
        }
    }

    /// Returns true if throttling is switched on.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Counts a request for `key` at `now` and reports whether it may proceed.
    pub fn check(&mut self, key: &str, now: DateTime<Utc>) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::Allowed {
                remaining: u32::MAX,
            };
        }

        let window = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window {
                request_count: 0,
                window_start: now,
            });

        let window_end = window.window_start + self.config.time_window;
        if now >= window_end {
            window.request_count = 0;
            window.window_start = now;
        }

        if window.request_count >= self.config.max_requests {
            let reset_at = window.window_start + self.config.time_window;
            let wait_ms = (reset_at - now).num_milliseconds().max(0) as u64;
            return RateLimitResult::Limited {
                reset_at,
                retry_after_seconds: wait_ms.div_ceil(1000),
            };
        }

        window.request_count += 1;
        RateLimitResult::Allowed {
            remaining: self.config.max_requests - window.request_count,
        }
    }

    /// Resets the rate limit for a key.
    pub fn reset(&mut self, key: &str) {
        self.windows.remove(key);
    }

    /// Drops windows that ended before `now`.
    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let time_window = self.config.time_window;
        self.windows
            .retain(|_, window| window.window_start + time_window > now);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
