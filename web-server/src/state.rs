use crate::rate_limit::{RateLimiter, RouteLimits};
use insights_core::{AppConfig, CoreError, ErrorReporter, ExpiringCache};
use llm_interface::{Extraction, InsightExtractor};
use reddit_client::{RedditApiClient, RedditClient};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Body of a successful `POST /analyze`, as cached and as sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub extraction: Extraction,
    pub comment_count: usize,
    pub subreddit: String,
}

/// Hex SHA-256 of the submitted URL.
pub fn analysis_cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.trim().as_bytes()))
}

#[derive(Clone)]
pub struct AppState {
    pub reddit: Arc<RedditClient>,
    pub extractor: Arc<InsightExtractor>,
    pub analysis_cache: ExpiringCache<String, AnalysisResponse>,
    pub share_cache: ExpiringCache<String, Value>,
    pub limiter: Arc<RateLimiter>,
    pub reporter: ErrorReporter,
}

impl AppState {
    pub fn new(reddit: RedditClient, extractor: InsightExtractor) -> Self {
        let defaults = AppConfig::default();
        Self::with_parts(
            reddit,
            extractor,
            ExpiringCache::new(
                defaults.analysis_cache_capacity,
                defaults.analysis_cache_ttl(),
            ),
            ExpiringCache::new(defaults.share_cache_capacity, defaults.share_cache_ttl()),
            RateLimiter::default(),
        )
    }

    pub fn with_parts(
        reddit: RedditClient,
        extractor: InsightExtractor,
        analysis_cache: ExpiringCache<String, AnalysisResponse>,
        share_cache: ExpiringCache<String, Value>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            reddit: Arc::new(reddit),
            extractor: Arc::new(extractor),
            analysis_cache,
            share_cache,
            limiter: Arc::new(limiter),
            reporter: ErrorReporter::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let api = RedditApiClient::with_timeout(config.user_agent.as_str(), config.fetch_timeout())?
            .with_base_url(config.reddit_base_url.as_str());
        let extractor = InsightExtractor::from_config(config);

        info!(
            "Server key configured: {}, model: {}",
            extractor.has_default_key(),
            extractor.settings().model
        );

        Ok(Self::with_parts(
            RedditClient::new(api),
            extractor,
            ExpiringCache::new(config.analysis_cache_capacity, config.analysis_cache_ttl()),
            ExpiringCache::new(config.share_cache_capacity, config.share_cache_ttl()),
            RateLimiter::new(RouteLimits::default()),
        ))
    }

    pub fn with_limits(mut self, limits: RouteLimits) -> Self {
        self.limiter = Arc::new(RateLimiter::new(limits));
        self
    }

    pub fn share_ttl(&self) -> Duration {
        self.share_cache.ttl()
    }
}
