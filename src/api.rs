/// HTTP API поверх стадий пайплайна

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::config::{DriftConfig, PipelineConfig, SplitConfig, ValidationConfig};
use crate::error::PipelineError;
use crate::pipeline::{Pipeline, PipelineSummary};
use crate::preprocessing::{ColumnNormalizer, Splitter};
use crate::types::{Dataset, SplitResult};
use crate::validation::{DriftChecker, DriftReport, Schema, SchemaValidator, ValidationReport};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PipelineConfig>,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub data: Dataset,
    #[serde(default)]
    pub config: Option<ValidationConfig>,
}

#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub data: Dataset,
    #[serde(default)]
    pub config: Option<SplitConfig>,
}

#[derive(Debug, Deserialize)]
pub struct DriftRequest {
    pub train: Dataset,
    pub test: Dataset,
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::InputDomain(_) | PipelineError::MissingColumn(_) => StatusCode::BAD_REQUEST,
            PipelineError::UnknownDataset(_) => StatusCode::NOT_FOUND,
            PipelineError::ValidationFailed(_) | PipelineError::DriftDetected(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("Request failed: {}", self.0);
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/normalize", post(normalize))
        .route("/api/validate", post(validate))
        .route("/api/split", post(split))
        .route("/api/drift", post(drift))
        .route("/api/pipeline", post(run_pipeline))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Wine quality pipeline API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn normalize(Json(data): Json<Dataset>) -> Json<Dataset> {
    tracing::info!("Normalize request: {} rows", data.len());
    Json(ColumnNormalizer::normalize(&data))
}

async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidationReport> {
    tracing::info!("Validate request: {} rows", req.data.len());
    let config = req.config.unwrap_or_else(|| state.config.validation.clone());
    let schema = Schema::wine_quality(&config);
    Json(SchemaValidator::validate(&req.data, &schema))
}

async fn split(
    State(state): State<AppState>,
    Json(req): Json<SplitRequest>,
) -> ApiResult<SplitResult> {
    tracing::info!("Split request: {} rows", req.data.len());
    let config = req.config.unwrap_or_else(|| state.config.split.clone());
    Ok(Json(Splitter::split(&req.data, &config)?))
}

async fn drift(
    State(state): State<AppState>,
    Json(req): Json<DriftRequest>,
) -> ApiResult<DriftReport> {
    tracing::info!("Drift request: {} train / {} test rows", req.train.len(), req.test.len());
    let mut config: DriftConfig = state.config.drift.clone();
    if let Some(threshold) = req.threshold {
        config.threshold = threshold;
    }
    Ok(Json(DriftChecker::score(&req.train, &req.test, &config)?))
}

async fn run_pipeline(State(state): State<AppState>) -> ApiResult<PipelineSummary> {
    tracing::info!("Pipeline request");
    let config = Arc::clone(&state.config);
    let summary = tokio::task::spawn_blocking(move || Pipeline::run(&config))
        .await
        .map_err(|e| ApiError(PipelineError::Training(format!("pipeline task failed: {}", e))))??;
    Ok(Json(summary))
}
