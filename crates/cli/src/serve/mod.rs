//! `chainscope serve` -- HTTP API over the assessment engine.
//!
//! Endpoints:
//! - GET  /health                - Server status (exempt from auth)
//! - GET  /api/rules             - The complexity rule table
//! - GET  /api/history           - Aggregate integration history
//! - GET  /api/history/{chain}   - One chain's integration record
//! - GET  /api/protocols/{chain} - Largest DeFi protocols on a chain
//! - GET  /api/github-analyze    - Integration history mined from GitHub
//! - POST /api/sales-assess      - Rule-based assessment with chain metadata
//! - POST /api/analyze           - AI analysis as server-sent events
//! - POST /api/login             - Access password check (exempt from auth)
//!
//! Every response other than the event stream is JSON.

mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use chainscope_advisor::Analyst;
use chainscope_core::Assessor;
use chainscope_sources::{ChainDataService, GitHubClient};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use self::handlers::{
    handle_analyze, handle_github_analyze, handle_health, handle_history, handle_history_stats,
    handle_login, handle_not_found, handle_protocols, handle_rules, handle_sales_assess,
};
use self::middleware::{auth_middleware, rate_limit_middleware};
use self::state::{AppState, RateLimiter};

/// Maximum request body size: 64 KB.
const MAX_BODY_SIZE: usize = 64 * 1024;

const RATE_LIMIT_WINDOW_SECS: u64 = 60;

fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({ "error": message })))
}

/// Everything the server needs, already resolved from configuration.
pub(crate) struct ServeOptions {
    pub(crate) port: u16,
    pub(crate) assessor: Assessor,
    pub(crate) data: ChainDataService,
    pub(crate) analyst: Analyst,
    pub(crate) github: Option<GitHubClient>,
    pub(crate) rate_limit: u64,
    pub(crate) api_key: Option<String>,
    pub(crate) access_password: Option<String>,
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/rules", get(handle_rules))
        .route("/api/history", get(handle_history_stats))
        .route("/api/history/{chain}", get(handle_history))
        .route("/api/protocols/{chain}", get(handle_protocols))
        .route("/api/github-analyze", get(handle_github_analyze))
        .route("/api/sales-assess", post(handle_sales_assess))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/login", post(handle_login))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub(crate) async fn start_server(options: ServeOptions) -> Result<(), Box<dyn std::error::Error>> {
    if options.api_key.is_some() {
        info!("API key authentication enabled");
    }
    if options.access_password.is_none() {
        warn!("no access password configured; /api/login will refuse every attempt");
    }
    info!(
        rate_limit = options.rate_limit,
        "rate limit per client IP per minute"
    );

    let state = Arc::new(AppState {
        assessor: options.assessor,
        data: options.data,
        analyst: Arc::new(options.analyst),
        github: options.github,
        rate_limiter: RateLimiter::new(options.rate_limit),
        api_key: options.api_key,
        access_password: options.access_password,
    });

    let addr = format!("0.0.0.0:{}", options.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("chainscope listening on http://{}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
