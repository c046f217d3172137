//! Route handlers: health, rules, history, protocols, assessment, analysis,
//! repository analysis and login.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chainscope_advisor::AnalysisEvent;
use chainscope_core::{rules, Assessment};
use chainscope_sources::defillama::DEFAULT_PROTOCOL_LIMIT;
use chainscope_sources::{ChainProfile, FamilyInfo, RepositoryReport};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use super::json_error;
use super::state::AppState;

pub(crate) const ASSESSMENT_TYPE: &str = "SALES_EARLY_STAGE";
const CHAIN_REQUIRED: &str = "Chain name is required";
const MAX_PROTOCOL_LIMIT: usize = 100;
const GITHUB_OFFLINE: &str = "GitHub analysis is unavailable in offline mode";
const SESSION_COOKIE: &str = "authenticated=true; HttpOnly; SameSite=Strict; Max-Age=86400; Path=/";

pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "rules": rules().len(),
        "historyAvailable": state.assessor.history().is_available(),
    }))
}

/// GET /api/rules
pub(crate) async fn handle_rules() -> impl IntoResponse {
    Json(serde_json::json!({ "rules": crate::report::rules_json() }))
}

/// GET /api/history
pub(crate) async fn handle_history_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.assessor.history().stats())
}

/// GET /api/history/{chain}
pub(crate) async fn handle_history(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
) -> Response {
    match state.assessor.history().record(&chain) {
        Some(record) => Json(record).into_response(),
        None => json_error(
            StatusCode::NOT_FOUND,
            &format!("no integration record for '{}'", chain),
        )
        .into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProtocolsQuery {
    #[serde(default)]
    limit: Option<usize>,
}

/// GET /api/protocols/{chain}?limit=N
pub(crate) async fn handle_protocols(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
    query: Result<Query<ProtocolsQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return json_error(StatusCode::BAD_REQUEST, "limit must be a positive integer")
            .into_response();
    };
    let Some(chain) = chain_name(Some(&chain)) else {
        return json_error(StatusCode::BAD_REQUEST, CHAIN_REQUIRED).into_response();
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PROTOCOL_LIMIT)
        .clamp(1, MAX_PROTOCOL_LIMIT);

    let protocols = state.data.top_protocols(&chain, limit).await;
    Json(serde_json::json!({ "chain": chain, "protocols": protocols })).into_response()
}

// ── Assessment ───────────────────────────────────────────────────────

/// Body of `POST /api/sales-assess`. Metric fields override what the
/// metadata sources report.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssessRequest {
    #[serde(default)]
    chain_name: Option<String>,
    #[serde(default)]
    tvl: Option<f64>,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    protocols: Option<u32>,
    #[serde(default)]
    mainnet_live: Option<bool>,
}

/// Chain metadata echoed alongside a sales assessment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChainData {
    name: String,
    tvl: String,
    tvl_raw: Option<f64>,
    rank: Option<u32>,
    protocols: Option<u32>,
    #[serde(rename = "change24h")]
    change_24h: Option<f64>,
    rpc_url: String,
    chain_id: String,
    explorer_url: String,
    ticker: String,
}

impl ChainData {
    fn new(chain: &str, profile: &ChainProfile) -> Self {
        ChainData {
            name: chain.to_string(),
            tvl: profile
                .tvl_formatted
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            tvl_raw: profile.tvl,
            rank: profile.chain_rank,
            protocols: profile.protocols,
            change_24h: profile.change_24h,
            rpc_url: profile.rpc_url.clone(),
            chain_id: profile.chain_id.clone(),
            explorer_url: profile.explorer_url.clone(),
            ticker: profile.ticker.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SalesAssessment {
    #[serde(flatten)]
    assessment: Assessment,
    chain_data: ChainData,
    timestamp: String,
    assessment_type: &'static str,
}

/// Trimmed chain name, or None when missing or blank.
fn chain_name(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

/// POST /api/sales-assess
pub(crate) async fn handle_sales_assess(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AssessRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => {
            return json_error(StatusCode::BAD_REQUEST, &format!("invalid request: {}", e))
                .into_response()
        }
    };
    let Some(chain) = chain_name(request.chain_name.as_deref()) else {
        return json_error(StatusCode::BAD_REQUEST, CHAIN_REQUIRED).into_response();
    };

    let profile = state.data.profile(&chain).await;
    let mut snapshot = profile.snapshot(&chain);
    if request.tvl.is_some() {
        snapshot.tvl = request.tvl;
    }
    if request.rank.is_some() {
        snapshot.rank = request.rank;
    }
    if request.protocols.is_some() {
        snapshot.protocols = request.protocols;
    }
    if request.mainnet_live.is_some() {
        snapshot.mainnet_live = request.mainnet_live;
    }

    let assessment = state.assessor.assess(snapshot);
    info!(
        chain = %chain,
        complexity = %assessment.complexity,
        weeks = assessment.estimated_weeks,
        priority = %assessment.recommended_priority,
        "sales assessment"
    );

    Json(SalesAssessment {
        assessment,
        chain_data: ChainData::new(&chain, &profile),
        timestamp: now_rfc3339(),
        assessment_type: ASSESSMENT_TYPE,
    })
    .into_response()
}

// ── AI analysis ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeRequest {
    #[serde(default)]
    chain_name: Option<String>,
}

/// POST /api/analyze -- server-sent events, one per [`AnalysisEvent`].
pub(crate) async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let chain = match body {
        Ok(Json(request)) => chain_name(request.chain_name.as_deref()),
        Err(_) => None,
    };
    let Some(chain) = chain else {
        return json_error(StatusCode::BAD_REQUEST, CHAIN_REQUIRED).into_response();
    };

    let (tx, rx) = mpsc::channel::<AnalysisEvent>(32);
    let analyst = state.analyst.clone();
    tokio::spawn(async move {
        info!(chain = %chain, "analysis session started");
        analyst.run(&chain, tx).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok::<Event, Infallible>(Event::default().json_data(&event).unwrap_or_else(|e| {
            warn!(error = %e, "failed to encode analysis event");
            Event::default().data(r#"{"type":"error","error":"event encoding failed"}"#)
        }))
    });
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

// ── Repository analysis ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GitHubQuery {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    chain: Option<String>,
}

fn family_summary(family: &FamilyInfo) -> serde_json::Value {
    serde_json::json!({
        "name": family.name,
        "family": family.family,
        "commitCount": family.commit_count,
        "prCount": family.pr_count,
        "files": family.files.len(),
    })
}

fn report_with_summary(report: RepositoryReport) -> serde_json::Value {
    let summary = serde_json::json!({
        "totalFamilies": report.families.len(),
        "avgCommits": report.patterns.avg_commits,
        "avgPRs": report.patterns.avg_prs,
        "commonFiles": report.patterns.common_files,
    });
    serde_json::json!({
        "success": true,
        "families": report.families,
        "patterns": report.patterns,
        "summary": summary,
    })
}

/// GET /api/github-analyze?action=families|timeline|patterns|all&chain=
///
/// Unknown actions are treated as `all`.
pub(crate) async fn handle_github_analyze(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GitHubQuery>,
) -> Response {
    let action = query.action.as_deref().unwrap_or("all");
    let chain = chain_name(query.chain.as_deref());
    if action == "timeline" && chain.is_none() {
        return json_error(StatusCode::BAD_REQUEST, "Chain name required for timeline")
            .into_response();
    }
    let Some(github) = &state.github else {
        return json_error(StatusCode::SERVICE_UNAVAILABLE, GITHUB_OFFLINE).into_response();
    };

    let outcome = match (action, chain) {
        ("families", _) => github.families().await.map(|families| {
            serde_json::json!({
                "success": true,
                "count": families.len(),
                "families": families.iter().map(family_summary).collect::<Vec<_>>(),
            })
        }),
        ("timeline", Some(chain)) => match github.timeline(&chain).await {
            Ok(Some(timeline)) => Ok(serde_json::json!({ "success": true, "timeline": timeline })),
            Ok(None) => {
                return json_error(
                    StatusCode::NOT_FOUND,
                    &format!("No timeline found for {}", chain),
                )
                .into_response()
            }
            Err(e) => Err(e),
        },
        ("patterns", _) => github.report().await.map(|report| {
            serde_json::json!({
                "success": true,
                "families": report.families,
                "patterns": report.patterns,
            })
        }),
        _ => github.report().await.map(report_with_summary),
    };

    match outcome {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            warn!(action, error = %e, "GitHub analysis failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("GitHub analysis failed: {}", e),
            )
            .into_response()
        }
    }
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    password: Option<String>,
}

/// POST /api/login
pub(crate) async fn handle_login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid request").into_response();
    };
    let Some(expected) = state.access_password.as_deref() else {
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Access password not configured",
        )
        .into_response();
    };
    if request.password.as_deref() != Some(expected) {
        return json_error(StatusCode::UNAUTHORIZED, "Invalid password").into_response();
    }

    (
        StatusCode::OK,
        [(header::SET_COOKIE, SESSION_COOKIE)],
        Json(serde_json::json!({
            "success": true,
            "message": "Authentication successful",
        })),
    )
        .into_response()
}
