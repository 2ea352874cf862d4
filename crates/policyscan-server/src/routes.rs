//! HTTP routes and handlers

use axum::{
    extract::{multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::state::AppState;
use policyscan_analysis::{AnalysisReport, AnalysisRun};
use policyscan_core::{Category, Error};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/analyze-policy/", post(analyze_policy))
        .route("/analyze-policy", post(analyze_policy))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Insurance Policy Analyzer API",
        "version": env!("CARGO_PKG_VERSION"),
        "pattern_set_version": state.registry.version(),
        "endpoints": {
            "/analyze-policy/": "POST - Upload and analyze a PDF insurance policy",
            "/health": "GET - Health check endpoint",
            "/metrics": "GET - Prometheus metrics",
            "/": "GET - This information",
        }
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "metrics exporter is not installed" })),
        )
            .into_response(),
    }
}

/// Response body of a successful analysis
#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    filename: String,
    analysis: AnalysisReport,
}

/// The uploaded `file` field
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Extract and analyze an uploaded policy PDF
async fn analyze_policy(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    metrics::counter!("policyscan_documents_total").increment(1);

    let mut multipart = multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let Upload { filename, bytes } = read_upload(&mut multipart).await?;
    info!(filename = %filename, bytes = bytes.len(), "Received policy upload");

    if !is_pdf_filename(&filename) {
        warn!(filename = %filename, "Rejected non-PDF upload");
        return Err(AppError::InvalidRequest(
            "Only PDF files are supported".to_string(),
        ));
    }

    let extractor = state.extractor.clone();
    let analyzer = state.analyzer.clone();
    let run: AnalysisRun = tokio::task::spawn_blocking(move || {
        let document = extractor.extract(&bytes)?;
        if document.is_blank() {
            warn!("Document has no extractable text");
        }
        analyzer.run(&document)
    })
    .await
    .map_err(|e| AppError::Internal(format!("analysis task failed: {}", e)))??;

    record_run(&run);
    info!(
        filename = %filename,
        pages = run.stats.pages,
        findings = run.report.total(),
        latency_us = run.stats.latency_us,
        "Policy analyzed"
    );

    Ok(Json(AnalyzeResponse {
        filename,
        analysis: run.report,
    }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::InvalidRequest(
        "multipart field `file` is required".to_string(),
    ))
}

fn is_pdf_filename(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
}

fn record_run(run: &AnalysisRun) {
    metrics::histogram!("policyscan_analysis_latency_us").record(run.stats.latency_us as f64);
    for category in Category::ALL {
        metrics::counter!("policyscan_findings_total", "category" => category.as_str())
            .increment(run.report.count(category) as u64);
    }
}

async fn fallback() -> AppError {
    AppError::NotFound
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidRequest(err.body_text())
    }
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    PayloadTooLarge(String),
    NotFound,
    Internal(String),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::Extraction(msg) => AppError::InvalidRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_string()),
            AppError::Internal(msg) => {
                error!("Analysis failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    format!("An error occurred while processing the file: {}", msg),
                )
            }
        };
        metrics::counter!("policyscan_errors_total", "kind" => kind).increment(1);

        (status, Json(json!({ "error": message }))).into_response()
    }
}
