use crate::normalize::{normalize_url, CANONICAL_ORIGIN};
use insights_core::{CoreError, RedditApiError, ThreadSummary};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Characters of a post title kept in a [`ThreadSummary`].
pub const SUMMARY_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct RedditListing<T> {
    pub kind: Option<String>,
    #[serde(default)]
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct RedditListingData<T> {
    #[serde(default)]
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

impl<T> Default for RedditListingData<T> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            after: None,
            before: None,
            dist: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct RedditListingChild<T> {
    pub kind: Option<String>,
    #[serde(default)]
    pub data: T,
}

/// The subset of a listing post the scanner needs. Every field tolerates
/// absence or `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    pub id: Option<String>,
    pub title: Option<String>,
    pub subreddit: Option<String>,
    pub permalink: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub created_utc: Option<f64>,
    pub stickied: Option<bool>,
}

impl RedditPostData {
    pub fn is_stickied(&self) -> bool {
        self.stickied.unwrap_or(false)
    }

    pub fn comment_count(&self) -> i64 {
        self.num_comments.unwrap_or(0)
    }
}

impl From<RedditPostData> for ThreadSummary {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            title: post_data
                .title
                .unwrap_or_default()
                .chars()
                .take(SUMMARY_TITLE_CHARS)
                .collect(),
            url: format!(
                "https://reddit.com{}",
                post_data.permalink.as_deref().unwrap_or_default()
            ),
            score: post_data.score.unwrap_or(0),
            num_comments: post_data.num_comments.unwrap_or(0),
            created_utc: post_data.created_utc.unwrap_or(0.0) as i64,
        }
    }
}

/// Anonymous client for Reddit's public `.json` endpoints. Every request
/// carries a descriptive User-Agent; Reddit rejects default ones. Nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct RedditApiClient {
    http_client: Client,
    user_agent: String,
    base_url: String,
    timeout: Duration,
}

impl RedditApiClient {
    pub fn new(user_agent: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_timeout(user_agent, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let user_agent = user_agent.into();
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            user_agent,
            base_url: CANONICAL_ORIGIN.to_string(),
            timeout,
        })
    }

    /// Points the client at another origin. Thread URLs are canonicalized to
    /// `https://www.reddit.com` first and then re-rooted here.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Canonical fetch URL for a user-supplied thread URL.
    pub fn thread_endpoint(&self, url: &str) -> String {
        let normalized = normalize_url(url);
        match normalized.strip_prefix(CANONICAL_ORIGIN) {
            Some(path) if self.base_url != CANONICAL_ORIGIN => {
                format!("{}{}", self.base_url, path)
            }
            _ => normalized,
        }
    }

    pub async fn make_request(&self, url: &str, resource: &str) -> Result<Response, CoreError> {
        let start_time = Instant::now();

        info!("Making Reddit request: GET {}", url);
        let response = match self
            .http_client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for GET {}: {}", url, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        debug!(
            "Reddit responded {} for {} in {:?}",
            status,
            resource,
            start_time.elapsed()
        );

        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, resource);
        Err(CoreError::RedditApi(status_error(&response, status, resource)))
    }

    /// Fetches raw thread JSON. Reddit answers thread endpoints with
    /// `[post-listing, comment-listing]`, occasionally with a single listing.
    pub async fn fetch_thread(&self, url: &str) -> Result<Value, CoreError> {
        let endpoint = self.thread_endpoint(url);
        let response = self.make_request(&endpoint, url).await?;

        let thread: Value = response.json().await.map_err(|e| {
            error!("Failed to parse thread JSON: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Thread response was not valid JSON: {}", e),
            })
        })?;

        info!("Retrieved thread JSON from {}", endpoint);
        Ok(thread)
    }

    /// Fetches the `hot` listing of a subreddit.
    pub async fn get_subreddit_hot(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let url = format!("{}/r/{}/hot.json?limit={}", self.base_url, subreddit, limit);
        let resource = format!("r/{}", subreddit);
        let response = self.make_request(&url, &resource).await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit listing: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }
}

fn status_error(response: &Response, status: StatusCode, resource: &str) -> RedditApiError {
    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited by Reddit, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        403 => RedditApiError::Forbidden {
            resource: resource.to_string(),
        },
        404 => RedditApiError::NotFound {
            resource: resource.to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::UnexpectedStatus {
            status_code: code,
            resource: resource.to_string(),
        },
    }
}
