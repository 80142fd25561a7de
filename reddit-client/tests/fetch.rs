use insights_core::{CoreError, RedditApiError};
use reddit_client::{RedditApiClient, RedditClient};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "RedditInsightsTool/1.0 (Educational Purpose)";

fn thread_payload() -> serde_json::Value {
    json!([
        {"kind": "Listing", "data": {"children": [
            {"kind": "t3", "data": {
                "title": "What tools do you pay for?",
                "selftext": "Curious what people use",
                "author": "op",
                "score": 120,
                "num_comments": 3,
                "created_utc": 1700000000.0,
                "subreddit": "SaaS",
                "url": "https://www.reddit.com/r/SaaS/comments/abc123/what_tools/"
            }}
        ]}},
        {"kind": "Listing", "data": {"children": [
            {"kind": "t1", "data": {"body": "Invoicing is painful", "author": "a", "score": 40,
                "replies": {"kind": "Listing", "data": {"children": [
                    {"kind": "t1", "data": {"body": "[deleted]", "author": "[deleted]", "score": 1,
                        "replies": {"kind": "Listing", "data": {"children": [
                            {"kind": "t1", "data": {"body": "Would pay $50/mo", "author": "c", "score": 9, "replies": ""}}
                        ]}}}}
                ]}}}},
            {"kind": "more", "data": {"children": ["zzz"]}}
        ]}}
    ])
}

async fn client_for(server: &MockServer) -> RedditClient {
    let api = RedditApiClient::new(USER_AGENT)
        .unwrap()
        .with_base_url(server.uri());
    RedditClient::new(api)
}

#[tokio::test]
async fn test_fetch_and_flatten_thread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/SaaS/comments/abc123/what_tools.json"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let thread = client
        .fetch_flattened("https://old.reddit.com/r/SaaS/comments/abc123/what_tools/?utm=x")
        .await
        .unwrap();

    assert_eq!(thread.subreddit(), "SaaS");
    let comments: Vec<_> = thread.comments().map(|c| (c.body.as_str(), c.depth)).collect();
    assert_eq!(
        comments,
        vec![("Invoicing is painful", 0), ("Would pay $50/mo", 2)]
    );
}

#[tokio::test]
async fn test_not_found_maps_to_reddit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/gone/title")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::RedditApi(RedditApiError::NotFound { .. })
    ));
    assert!(err.is_upstream_fetch());
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "42"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/abc/title")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 42 })
    ));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/abc/title")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 })
    ));
}

#[tokio::test]
async fn test_invalid_json_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/abc/title")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::RedditApi(RedditApiError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_thread_without_content_is_empty_thread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"kind": "Listing", "data": {"children": []}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {"body": "[removed]", "replies": ""}}
            ]}}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/abc/title")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::EmptyThread { .. }));
}

#[tokio::test]
async fn test_post_with_only_scrubbed_comments_is_empty_thread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {"title": "Anyone else?", "selftext": "Long story",
                    "score": 12, "subreddit": "SaaS"}}
            ]}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {"body": "[deleted]", "score": 4,
                    "replies": {"kind": "Listing", "data": {"children": [
                        {"kind": "t1", "data": {"body": "", "score": 1, "replies": ""}}
                    ]}}}},
                {"kind": "t1", "data": {"body": "[removed]", "score": 2, "replies": ""}}
            ]}}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/abc/title")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::EmptyThread { .. }));
}

/// A single reply chain `levels` comments deep, starting at depth 0.
fn reply_chain(levels: usize) -> serde_json::Value {
    let mut replies = json!("");
    for level in (0..levels).rev() {
        replies = json!({"kind": "Listing", "data": {"children": [
            {"kind": "t1", "data": {"body": format!("level {}", level), "score": 1, "replies": replies}}
        ]}});
    }
    json!([
        {"kind": "Listing", "data": {"children": [
            {"kind": "t3", "data": {"title": "Deep", "subreddit": "SaaS"}}
        ]}},
        replies
    ])
}

#[tokio::test]
async fn test_depth_override_caps_flattened_comments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_chain(8)))
        .mount(&server)
        .await;

    let client = client_for(&server).await.with_max_depth(3);
    let thread = client
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/deep/title")
        .await
        .unwrap();

    let depths: Vec<_> = thread.comments().map(|c| c.depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 3]);

    let full = client_for(&server).await;
    let thread = full
        .fetch_flattened("https://www.reddit.com/r/SaaS/comments/deep/title")
        .await
        .unwrap();
    assert_eq!(thread.comment_count(), 8);
}

#[tokio::test]
async fn test_scan_hot_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/SaaS/hot.json"))
        .and(query_param("limit", "15"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Listing",
            "data": {"children": [
                {"kind": "t3", "data": {"title": "Weekly thread", "stickied": true,
                    "num_comments": 300, "score": 5, "permalink": "/r/SaaS/comments/w/"}},
                {"kind": "t3", "data": {"title": "Quiet", "num_comments": 2, "score": 500,
                    "permalink": "/r/SaaS/comments/q/"}},
                {"kind": "t3", "data": {"title": "Busy", "num_comments": 40, "score": 10,
                    "permalink": "/r/SaaS/comments/b/", "created_utc": 1700000000.0}},
                {"kind": "t3", "data": {"title": "Popular", "num_comments": 30, "score": 200,
                    "permalink": "/r/SaaS/comments/p/"}}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.scanner().scan("r/SaaS/").await.unwrap();

    assert_eq!(result.subreddit, "SaaS");
    let titles: Vec<_> = result.threads.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Popular", "Busy"]);
    assert_eq!(result.threads[1].url, "https://reddit.com/r/SaaS/comments/b/");
    assert_eq!(result.threads[1].created_utc, 1700000000);
}
