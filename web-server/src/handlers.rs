use crate::error::ApiError;
use crate::pages::{shared_page, INDEX_HTML};
use crate::state::{analysis_cache_key, AnalysisResponse, AppState};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use llm_interface::format_for_llm;
use reddit_client::ScanResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanRequest {
    pub subreddit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub share_id: String,
}

/// Characters of a v4 UUID used as a share id.
pub const SHARE_ID_LEN: usize = 8;

/// Bodies that are missing or not JSON read as an empty request.
fn parse_body<T: Default + for<'de> Deserialize<'de>>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> &'static str {
    "ok"
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let request: AnalyzeRequest = parse_body(&body);
    let url = request.url.as_deref().unwrap_or_default().trim().to_string();
    let user_key = request
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty());

    reddit_client::validate_thread_url(&url).map_err(|e| ApiError::from_analyze(&e))?;

    let response = match user_key {
        Some(key) => run_analysis(&state, &url, Some(key)).await?,
        // Concurrent cold requests for one URL share a single fetch and completion.
        None => {
            state
                .analysis_cache
                .get_or_compute(
                    analysis_cache_key(&url),
                    || run_analysis(&state, &url, None),
                    |response| !response.extraction.outcome.is_prompt_only(),
                )
                .await?
        }
    };

    Ok(Json(response))
}

/// Fetch, flatten, format and extract one thread.
async fn run_analysis(
    state: &AppState,
    url: &str,
    user_key: Option<&str>,
) -> Result<AnalysisResponse, ApiError> {
    let thread = state.reddit.fetch_flattened(url).await.map_err(|e| {
        state.reporter.report(&e);
        ApiError::from_analyze(&e)
    })?;

    let formatted = format_for_llm(&thread);
    let subreddit = thread.subreddit().to_string();
    debug!(
        "Formatted {} comments into {} bytes",
        thread.comment_count(),
        formatted.len()
    );

    let extraction = state
        .extractor
        .extract(&formatted, &subreddit, user_key)
        .await;
    info!("Analyzed {} ({} comments)", url, thread.comment_count());

    Ok(AnalysisResponse {
        extraction,
        comment_count: thread.comment_count(),
        subreddit,
    })
}

/// POST /scan-subreddit
pub async fn scan_subreddit(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ScanResult>, ApiError> {
    let request: ScanRequest = parse_body(&body);
    let raw_name = request.subreddit.unwrap_or_default();

    let result = state
        .reddit
        .scanner()
        .scan(&raw_name)
        .await
        .map_err(|e| {
            state.reporter.report(&e);
            ApiError::from_scan(&e)
        })?;
    Ok(Json(result))
}

/// POST /share
pub async fn share(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ShareResponse>, ApiError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Failed to create share link: {}", e),
        )
    })?;

    let share_id: String = uuid::Uuid::new_v4()
        .to_string()
        .chars()
        .take(SHARE_ID_LEN)
        .collect();
    state.share_cache.insert(share_id.clone(), payload).await;

    info!(
        "Stored shared result {} for {:?}",
        share_id,
        state.share_ttl()
    );
    Ok(Json(ShareResponse { share_id }))
}

/// GET /s/:share_id
pub async fn view_shared(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Html<String> {
    match state.share_cache.get(&share_id).await {
        Some(payload) => Html(shared_page(&share_id, &payload)),
        None => {
            debug!("Share {} missing or expired", share_id);
            Html(INDEX_HTML.to_string())
        }
    }
}
