//! REST API server for AeroChain
//!
//! Exposes the ledger engine over HTTP: fetch the chain, submit a maintenance
//! record, request validation, plus read-only views per subject.

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{subject_history, Block, Ledger, LedgerStats, ValidationReport};
use crate::error::LedgerError;
use crate::record::RecordInput;

/// Shared state behind every route.
pub struct Node {
    pub ledger: Arc<Ledger>,
    api_stats: RwLock<ApiStats>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    records_submitted: u64,
    validations_run: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl Node {
    pub fn new(ledger: Ledger) -> Self {
        Self::new_shared(Arc::new(ledger))
    }

    /// Create a node over a ledger that other components also hold.
    pub fn new_shared(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            api_stats: RwLock::new(ApiStats::new()),
        }
    }

    /// Run a blocking ledger operation off the async runtime.
    async fn with_ledger<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Ledger) -> Result<T, LedgerError> + Send + 'static,
    {
        let ledger = self.ledger.clone();
        tokio::task::spawn_blocking(move || op(ledger.as_ref()))
            .await
            .map_err(|e| ApiError::InternalError(format!("ledger task failed: {}", e)))?
            .map_err(ApiError::from)
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            records_submitted: stats.records_submitted,
            validations_run: stats.validations_run,
            uptime_seconds: stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0),
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    NotFound(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(e) => {
                let status = match &e {
                    LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    LedgerError::Serialization(_) | LedgerError::Config(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Ledger(LedgerError::InvalidInput(rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub records_submitted: u64,
    pub validations_run: u64,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecordsResponse {
    pub subject_id: String,
    pub count: usize,
    pub records: Vec<Block>,
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    node.api_stats.write().await.record_request(success);

    response
}

async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints (for testing)
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        // Ledger endpoints
        .route("/chain", get(get_chain))
        .route("/chain/blocks/:index", get(get_block_by_index))
        .route("/records", post(submit_record))
        .route("/validate", get(request_validation))
        // Read views
        .route("/subjects/:subject_id/records", get(get_subject_records))
        .route("/stats", get(get_ledger_stats))
        // System endpoints
        .route("/health", get(health_check))
        .route("/server/stats", get(get_api_stats))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn run_api_server(node: Arc<Node>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Create the genesis block before accepting traffic.
    let length = node
        .with_ledger(|ledger| ledger.initialize().map(|chain| chain.len()))
        .await
        .map_err(|e| format!("Failed to initialize ledger: {:?}", e))?;
    tracing::info!(blocks = length, "ledger.ready");

    let app = build_api_router(node);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "api.listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_chain(State(node): State<Arc<Node>>) -> Result<Json<Vec<Block>>, ApiError> {
    let chain = node.with_ledger(|ledger| ledger.initialize()).await?;
    Ok(Json(chain))
}

async fn get_block_by_index(
    State(node): State<Arc<Node>>,
    Path(index): Path<u64>,
) -> Result<Json<Block>, ApiError> {
    let chain = node.with_ledger(|ledger| ledger.initialize()).await?;

    usize::try_from(index)
        .ok()
        .and_then(|i| chain.get(i))
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Block at index {} not found", index)))
        .map(Json)
}

async fn submit_record(
    State(node): State<Arc<Node>>,
    payload: Result<Json<RecordInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let Json(input) = payload?;
    let block = node.with_ledger(move |ledger| ledger.append(input)).await?;

    node.api_stats.write().await.records_submitted += 1;

    Ok((StatusCode::CREATED, Json(block)))
}

async fn request_validation(State(node): State<Arc<Node>>) -> Result<Json<ValidationReport>, ApiError> {
    let report = node.with_ledger(|ledger| ledger.validate()).await?;

    node.api_stats.write().await.validations_run += 1;

    Ok(Json(report))
}

async fn get_subject_records(
    State(node): State<Arc<Node>>,
    Path(subject_id): Path<String>,
) -> Result<Json<SubjectRecordsResponse>, ApiError> {
    let chain = node.with_ledger(|ledger| ledger.initialize()).await?;
    let records: Vec<Block> = subject_history(&chain, &subject_id)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(SubjectRecordsResponse {
        subject_id,
        count: records.len(),
        records,
    }))
}

async fn get_ledger_stats(State(node): State<Arc<Node>>) -> Result<Json<LedgerStats>, ApiError> {
    let chain = node.with_ledger(|ledger| ledger.initialize()).await?;
    Ok(Json(LedgerStats::from_chain(&chain)))
}

async fn get_api_stats(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.get_stats().await)
}
