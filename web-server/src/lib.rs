pub mod error;
pub mod handlers;
pub mod pages;
pub mod rate_limit;
pub mod state;

pub use error::ApiError;
pub use rate_limit::{RateLimitConfig, RateLimiter, RouteClass, RouteLimits};
pub use state::{analysis_cache_key, AnalysisResponse, AppState};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Client address used for rate limiting; requests without connection
/// info share one bucket.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let class = RouteClass::from_path(request.uri().path());
    let client = client_key(&request);

    match state.limiter.check(class, &client).await {
        Ok(()) => next.run(request).await,
        Err(wait) => ApiError::rate_limited(wait).into_response(),
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/analyze", post(handlers::analyze))
        .route("/scan-subreddit", post(handlers::scan_subreddit))
        .route("/share", post(handlers::share))
        .route("/s/:share_id", get(handlers::view_shared))
        .layer(middleware::from_fn_with_state(state.clone(), enforce_rate_limit))
        // health checks bypass the limiter
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
