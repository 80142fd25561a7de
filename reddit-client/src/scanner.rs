use crate::api::{RedditApiClient, RedditPostData};
use crate::normalize::{clean_subreddit_name, is_valid_subreddit_name};
use insights_core::{CoreError, ThreadSummary};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Posts requested from the hot listing.
pub const HOT_LISTING_LIMIT: u32 = 15;
/// Threads with fewer comments than this are not worth analyzing.
pub const MIN_COMMENTS: i64 = 5;
pub const MAX_RESULTS: usize = 10;

pub const MISSING_SUBREDDIT_MESSAGE: &str = "Please provide a subreddit name";
pub const INVALID_SUBREDDIT_MESSAGE: &str = "Please provide a valid subreddit name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub subreddit: String,
    pub threads: Vec<ThreadSummary>,
}

/// Drops stickied and low-comment posts, then ranks by engagement.
///
/// The sort is stable, so threads with equal engagement keep their listing
/// order.
pub fn rank_threads(posts: impl IntoIterator<Item = RedditPostData>) -> Vec<ThreadSummary> {
    let mut threads: Vec<ThreadSummary> = posts
        .into_iter()
        .filter(|post| !post.is_stickied() && post.comment_count() >= MIN_COMMENTS)
        .map(ThreadSummary::from)
        .collect();

    threads.sort_by(|a, b| {
        b.engagement()
            .partial_cmp(&a.engagement())
            .unwrap_or(Ordering::Equal)
    });
    threads.truncate(MAX_RESULTS);
    threads
}

pub struct SubredditScanner {
    client: RedditApiClient,
}

impl SubredditScanner {
    pub fn new(client: RedditApiClient) -> Self {
        Self { client }
    }

    /// `raw_name` may carry `r/` or slashes; they are stripped first. Whatever
    /// remains must be letters, digits or underscores.
    pub async fn scan(&self, raw_name: &str) -> Result<ScanResult, CoreError> {
        let subreddit = clean_subreddit_name(raw_name);
        if subreddit.is_empty() {
            return Err(CoreError::invalid_input(MISSING_SUBREDDIT_MESSAGE));
        }
        if !is_valid_subreddit_name(&subreddit) {
            return Err(CoreError::invalid_input(INVALID_SUBREDDIT_MESSAGE));
        }

        let listing = self
            .client
            .get_subreddit_hot(&subreddit, HOT_LISTING_LIMIT)
            .await?;
        let candidates = listing.data.children.len();
        let threads = rank_threads(listing.data.children.into_iter().map(|child| child.data));

        debug!(
            "Ranked {} of {} hot posts in r/{}",
            threads.len(),
            candidates,
            subreddit
        );
        info!("Scan of r/{} produced {} threads", subreddit, threads.len());

        Ok(ScanResult { subreddit, threads })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, score: i64, comments: i64) -> RedditPostData {
        RedditPostData {
            title: Some(title.to_string()),
            permalink: Some(format!("/r/test/comments/{title}/")),
            score: Some(score),
            num_comments: Some(comments),
            ..RedditPostData::default()
        }
    }

    fn titles(threads: &[ThreadSummary]) -> Vec<&str> {
        threads.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_ranking_by_engagement() {
        let ranked = rank_threads(vec![
            post("low", 0, 10),
            post("high", 100, 10),
            post("mid", 50, 10),
        ]);
        assert_eq!(titles(&ranked), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        // 10 * (1 + 100/100) == 20 * (1 + 0/100)
        let ranked = rank_threads(vec![
            post("first", 100, 10),
            post("second", 0, 20),
            post("third", 100, 10),
        ]);
        assert_eq!(titles(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_filters_stickied_and_quiet_threads() {
        let mut sticky = post("sticky", 1000, 500);
        sticky.stickied = Some(true);
        let ranked = rank_threads(vec![sticky, post("quiet", 10, 4), post("ok", 1, 5)]);
        assert_eq!(titles(&ranked), vec!["ok"]);
    }

    #[test]
    fn test_truncates_to_top_ten() {
        let posts: Vec<_> = (0..15).map(|i| post(&format!("p{i}"), i, 10)).collect();
        let ranked = rank_threads(posts);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].title, "p14");
    }

    #[test]
    fn test_negative_scores_rank_lower() {
        let ranked = rank_threads(vec![post("downvoted", -50, 10), post("neutral", 0, 10)]);
        assert_eq!(titles(&ranked), vec!["neutral", "downvoted"]);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected_before_fetch() {
        let scanner = SubredditScanner::new(RedditApiClient::new("ua/1.0").unwrap());
        let err = scanner.scan(" r/ ").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_name_with_url_syntax_is_rejected_before_fetch() {
        // Unroutable origin: any fetch attempt would surface as a network error
        let api = RedditApiClient::new("ua/1.0")
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let scanner = SubredditScanner::new(api);

        for raw in ["SaaS?limit=100#", "r/SaaS.json", "../api/v1/me", "rust lang"] {
            match scanner.scan(raw).await {
                Err(CoreError::InvalidInput { message }) => {
                    assert_eq!(message, INVALID_SUBREDDIT_MESSAGE, "{raw}")
                }
                other => panic!("Expected InvalidInput for {raw:?}, got {other:?}"),
            }
        }
    }
}
