//! HTTP server exposing `ask`, `search`, `rebuild`, and `stats`.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Description |
//! |--------|------|------|-------------|
//! | `GET`  | `/health` | | Health check (returns version) |
//! | `GET`  | `/stats` | | Strategy, snapshot, and engine summary |
//! | `POST` | `/search` | `{query, top_k?}` | Ranked passages |
//! | `POST` | `/ask` | `{question, method?}` | Answer envelope |
//! | `POST` | `/rebuild` | `{documents?}` | Replace the index; reloads `[corpus].path` when omitted |
//!
//! `/ask` reports engine failures inside the envelope (low confidence), never
//! as an HTTP error. Malformed requests are still rejected with
//! `bad_request` (400): an unparseable body, a blank `question`, or an
//! unknown `method`. The CLI `ah ask` has no such check and answers a blank
//! question with a low-confidence envelope.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid request: query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `rebuild_in_progress` (409),
//! `backend_error` (502), `index_unavailable` (503), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use answer_harness_core::models::{AnswerEnvelope, AskMethod, Document, RetrievalResult};
use answer_harness_core::router::RouterStats;
use answer_harness_core::RetrievalError;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::harness::{Extensions, Harness};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    harness: Arc<Harness>,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Builds the harness (indexing `[corpus].path` if set) before binding.
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_extensions(config, Extensions::default()).await
}

/// Like [`run_server`], with custom strategies or collaborators.
///
/// ```rust,no_run
/// use answer_harness::harness::Extensions;
/// use answer_harness::server::run_server_with_extensions;
///
/// # async fn example(config: &answer_harness::config::Config) -> anyhow::Result<()> {
/// let mut extensions = Extensions::default();
/// // extensions.structured = Some(Arc::new(MySqlEngine::new()));
/// run_server_with_extensions(config, extensions).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_extensions(
    config: &Config,
    extensions: Extensions,
) -> anyhow::Result<()> {
    let harness = Harness::with_extensions(config, extensions).await?;
    let stats = harness.stats();
    info!(
        strategy = %stats.strategy,
        documents = stats.snapshot.document_count,
        structured = %stats.structured_engine,
        generator = %stats.generator,
        "harness ready"
    );

    let app = router(Arc::new(harness));
    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Route table over an existing harness.
pub fn router(harness: Arc<Harness>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route("/search", post(handle_search))
        .route("/ask", post(handle_ask))
        .route("/rebuild", post(handle_rebuild))
        .layer(cors)
        .with_state(AppState { harness })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        let status = match &err {
            RetrievalError::InvalidRequest { .. } | RetrievalError::MalformedDocument { .. } => {
                StatusCode::BAD_REQUEST
            }
            RetrievalError::IndexUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            RetrievalError::Backend { .. } => StatusCode::BAD_GATEWAY,
            RetrievalError::RebuildInProgress => StatusCode::CONFLICT,
            RetrievalError::Configuration { .. } | RetrievalError::UnknownStrategy { .. } => {
                return internal(err.to_string());
            }
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<RetrievalError>() {
            Some(retrieval) => retrieval.clone().into(),
            None => internal(format!("{:#}", err)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Json<RouterStats> {
    Json(state.harness.stats())
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: RetrievalResult,
}

async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(req) = payload?;
    let results = state.harness.search(&req.query, req.top_k).await?;
    Ok(Json(SearchResponse { results }))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    method: Option<String>,
}

async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AnswerEnvelope>, AppError> {
    let Json(req) = payload?;
    if req.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let method = match req.method.as_deref() {
        Some(m) => m.parse::<AskMethod>().map_err(bad_request)?,
        None => AskMethod::Auto,
    };
    Ok(Json(state.harness.ask(&req.question, method).await))
}

// ============ POST /rebuild ============

#[derive(Deserialize, Default)]
struct RebuildRequest {
    #[serde(default)]
    documents: Option<Vec<Document>>,
}

#[derive(Serialize)]
struct RebuildResponse {
    status: String,
    document_count: usize,
    fingerprint: String,
}

/// The body is optional: an empty body reloads the corpus file.
async fn handle_rebuild(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RebuildResponse>, AppError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        RebuildRequest::default()
    } else {
        serde_json::from_slice::<RebuildRequest>(&body)
            .map_err(|e| bad_request(format!("invalid rebuild body: {}", e)))?
    };

    let info = state.harness.rebuild(req.documents).await.map_err(|e| {
        warn!(error = %format!("{:#}", e), "rebuild failed");
        AppError::from(e)
    })?;
    info!(
        documents = info.document_count,
        fingerprint = %info.fingerprint,
        "index rebuilt"
    );

    Ok(Json(RebuildResponse {
        status: "ok".to_string(),
        document_count: info.document_count,
        fingerprint: info.fingerprint,
    }))
}
