use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use insights_core::CoreError;
use serde_json::json;
use std::time::Duration;

pub const RATE_LIMITED_MESSAGE: &str =
    "Too many requests. Please wait a minute before trying again.";
pub const EMPTY_THREAD_MESSAGE: &str = "No content found in this thread";

/// An error answered as `{"error": message}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE)
        }
    }

    /// Maps a failure of the analyze pipeline.
    pub fn from_analyze(error: &CoreError) -> Self {
        Self::classify(error, "Failed to fetch Reddit thread", "Analysis failed")
    }

    /// Maps a failure of a subreddit scan.
    pub fn from_scan(error: &CoreError) -> Self {
        Self::classify(error, "Failed to fetch subreddit", "Scan failed")
    }

    fn classify(error: &CoreError, fetch_prefix: &str, other_prefix: &str) -> Self {
        match error {
            CoreError::InvalidInput { message } => Self::bad_request(message.clone()),
            CoreError::EmptyThread { .. } => Self::bad_request(EMPTY_THREAD_MESSAGE),
            e if e.is_upstream_fetch() => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {}", fetch_prefix, e),
            ),
            e => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {}", other_prefix, e),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "error": self.message }))).into_response();
        if let Some(wait) = self.retry_after {
            // Whole seconds, rounded up
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::RedditApiError;

    #[test]
    fn test_analyze_classification() {
        let invalid = ApiError::from_analyze(&CoreError::invalid_input("Please provide a Reddit URL"));
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.message, "Please provide a Reddit URL");

        let empty = ApiError::from_analyze(&CoreError::EmptyThread {
            url: "u".to_string(),
        });
        assert_eq!(empty.message, EMPTY_THREAD_MESSAGE);

        let fetch = ApiError::from_analyze(&CoreError::RedditApi(RedditApiError::ServerError {
            status_code: 502,
        }));
        assert_eq!(fetch.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(fetch.message.starts_with("Failed to fetch Reddit thread: "));

        let other = ApiError::from_analyze(&CoreError::Internal {
            message: "boom".to_string(),
        });
        assert_eq!(other.message, "Analysis failed: Internal error: boom");
    }

    #[test]
    fn test_scan_classification() {
        let fetch = ApiError::from_scan(&CoreError::RedditApi(RedditApiError::NotFound {
            resource: "r/nope".to_string(),
        }));
        assert!(fetch.message.starts_with("Failed to fetch subreddit: "));

        let other = ApiError::from_scan(&CoreError::Internal {
            message: "x".to_string(),
        });
        assert!(other.message.starts_with("Scan failed: "));
    }

    #[test]
    fn test_retry_after_header_rounds_up() {
        let response = ApiError::rate_limited(Duration::from_millis(5500)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "6");
    }
}
