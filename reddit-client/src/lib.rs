pub mod api;
pub mod flatten;
pub mod normalize;
pub mod scanner;


pub use api::{RedditApiClient, RedditListing, RedditPostData};
pub use flatten::{flatten_thread, Flattener, DEFAULT_MAX_DEPTH};
pub use normalize::{
    classify, clean_subreddit_name, is_thread_url, is_valid_subreddit_name, normalize_url, UrlKind,
};
pub use scanner::{
    rank_threads, ScanResult, SubredditScanner, INVALID_SUBREDDIT_MESSAGE,
    MISSING_SUBREDDIT_MESSAGE,
};

use insights_core::{CoreError, FlatThread};
use tracing::info;

pub const MISSING_URL_MESSAGE: &str = "Please provide a Reddit URL";
pub const INVALID_URL_MESSAGE: &str = "Please provide a valid Reddit URL";
pub const NOT_A_THREAD_MESSAGE: &str = "Please paste a specific thread URL, not a subreddit. Example: reddit.com/r/SaaS/comments/abc123/thread_title";

/// Checks a user-supplied URL before anything is fetched. The flattener
/// expects a post + comments payload, so subreddit-level URLs are refused.
pub fn validate_thread_url(url: &str) -> Result<(), CoreError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CoreError::invalid_input(MISSING_URL_MESSAGE));
    }
    if !normalize::is_reddit_url(url) {
        return Err(CoreError::invalid_input(INVALID_URL_MESSAGE));
    }
    if classify(url) != UrlKind::Thread {
        return Err(CoreError::invalid_input(NOT_A_THREAD_MESSAGE));
    }
    Ok(())
}

/// Fetch + flatten front end used by the analysis pipeline and the scanner.
#[derive(Debug, Clone)]
pub struct RedditClient {
    api: RedditApiClient,
    flattener: Flattener,
}

impl RedditClient {
    pub fn new(api: RedditApiClient) -> Self {
        Self {
            api,
            flattener: Flattener::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.flattener = Flattener::new(max_depth);
        self
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }

    pub fn max_depth(&self) -> usize {
        self.flattener.max_depth()
    }

    /// Validates, fetches and flattens one thread. A thread with no usable
    /// comments is reported as [`CoreError::EmptyThread`], even when the
    /// post itself survived.
    pub async fn fetch_flattened(&self, url: &str) -> Result<FlatThread, CoreError> {
        validate_thread_url(url)?;

        let raw = self.api.fetch_thread(url.trim()).await?;
        let thread = self.flattener.flatten(&raw);
        if thread.comment_count() == 0 {
            return Err(CoreError::EmptyThread {
                url: url.trim().to_string(),
            });
        }

        info!(
            "Flattened r/{} thread into {} comments",
            thread.subreddit(),
            thread.comment_count()
        );
        Ok(thread)
    }

    pub fn scanner(&self) -> SubredditScanner {
        SubredditScanner::new(self.api.clone())
    }
}
