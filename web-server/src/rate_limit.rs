//! Per-client token buckets for the HTTP surface.
//!
//! Each route class has its own budget and every client address gets a
//! separate bucket per class. Requests over budget are refused, never queued.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Buckets tracked before idle ones are swept.
const MAX_TRACKED_BUCKETS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            time_window: Duration::from_secs(60),
            burst_allowance: max_requests,
        }
    }

    pub fn per_hour(max_requests: u32) -> Self {
        Self {
            max_requests,
            time_window: Duration::from_secs(3600),
            burst_allowance: max_requests,
        }
    }

    fn refill_rate(&self) -> f64 {
        self.max_requests as f64 / self.time_window.as_secs_f64()
    }
}

#[derive(Debug)]
pub struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        Self {
            tokens: capacity,
            capacity,
            refill_rate: config.refill_rate(),
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Takes `tokens_needed` or reports how long until that many are available.
    pub fn acquire(&mut self, tokens_needed: f64) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= tokens_needed {
            self.tokens -= tokens_needed;
            Ok(())
        } else {
            let missing = tokens_needed - self.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    pub fn available_tokens(&mut self) -> f64 {
        self.refill();
        self.tokens
    }

    fn is_full(&mut self) -> bool {
        self.available_tokens() >= self.capacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Analyze,
    Scan,
    Share,
    Default,
}

impl RouteClass {
    pub fn from_path(path: &str) -> Self {
        match path {
            "/analyze" => RouteClass::Analyze,
            "/scan-subreddit" => RouteClass::Scan,
            "/share" => RouteClass::Share,
            _ => RouteClass::Default,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteLimits {
    pub analyze: RateLimitConfig,
    pub scan: RateLimitConfig,
    pub share: RateLimitConfig,
    pub default: RateLimitConfig,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            analyze: RateLimitConfig::per_minute(10),
            scan: RateLimitConfig::per_minute(5),
            share: RateLimitConfig::per_minute(10),
            default: RateLimitConfig::per_hour(100),
        }
    }
}

impl RouteLimits {
    pub fn for_class(&self, class: RouteClass) -> &RateLimitConfig {
        match class {
            RouteClass::Analyze => &self.analyze,
            RouteClass::Scan => &self.scan,
            RouteClass::Share => &self.share,
            RouteClass::Default => &self.default,
        }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    limits: RouteLimits,
    buckets: Mutex<HashMap<(RouteClass, String), TokenBucket>>,
}

impl RateLimiter {
    pub fn new(limits: RouteLimits) -> Self {
        Self {
            limits,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn limits(&self) -> &RouteLimits {
        &self.limits
    }

    /// Spends one token from `client`'s bucket for `class`. On refusal returns
    /// the wait until the next token.
    pub async fn check(&self, class: RouteClass, client: &str) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock().await;
        if buckets.len() >= MAX_TRACKED_BUCKETS {
            let before = buckets.len();
            buckets.retain(|_, bucket| !bucket.is_full());
            debug!("Swept {} idle rate-limit buckets", before - buckets.len());
        }

        let config = self.limits.for_class(class);
        let result = buckets
            .entry((class, client.to_string()))
            .or_insert_with(|| TokenBucket::new(config))
            .acquire(1.0);

        if let Err(wait) = result {
            warn!("Rate limit hit for {} on {:?}, retry in {:?}", client, class, wait);
        }
        result
    }

    pub async fn tracked_buckets(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RouteLimits::default())
    }
}
