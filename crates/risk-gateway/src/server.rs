//! HTTP server: prediction, health and metrics endpoints.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use risk_core::constants::SERVICE_VERSION;
use risk_core::{Error, PredictionResult, RecordBatch};
use risk_model::InferenceService;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::metrics::MetricsRegistry;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Client-facing message for every 400 response
const INVALID_INPUT: &str = "Invalid input format";

/// Client-facing message for 500 responses outside debug mode
const INTERNAL_ERROR: &str = "Internal server error";

/// Content type of the Prometheus text exposition
const METRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Server state shared by every request
pub struct AppState {
    /// Loaded inference pipeline
    pub service: Arc<InferenceService>,
    /// Metrics registry
    pub metrics: Arc<MetricsRegistry>,
    /// Application status
    pub status: RwLock<AppStatus>,
    /// Expose error details in 500 responses
    pub debug: bool,
    /// Largest batch accepted by `/predict`
    pub max_batch_rows: usize,
    started: Instant,
}

/// Application status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    /// Starting up
    Starting,
    /// Serving requests
    Running,
    /// Draining in-flight requests
    ShuttingDown,
    /// Stopped
    Stopped,
}

impl AppState {
    /// Create a new server state
    #[must_use]
    pub fn new(
        service: Arc<InferenceService>,
        metrics: Arc<MetricsRegistry>,
        config: &AppConfig,
    ) -> Self {
        Self {
            service,
            metrics,
            status: RwLock::new(AppStatus::Starting),
            debug: config.debug,
            max_batch_rows: config.max_batch_rows,
            started: Instant::now(),
        }
    }

    /// Set application status
    pub async fn set_status(&self, status: AppStatus) {
        let mut s = self.status.write().await;
        *s = status;
    }

    /// Get application status
    pub async fn get_status(&self) -> AppStatus {
        *self.status.read().await
    }

    /// Check if application is healthy
    pub async fn is_healthy(&self) -> bool {
        matches!(
            self.get_status().await,
            AppStatus::Running | AppStatus::Starting
        )
    }

    /// Seconds since the state was created
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status string
    pub status: &'static str,
    /// Artifacts are loaded
    pub model_loaded: bool,
    /// Service version
    pub version: &'static str,
    /// Version of the loaded model artifact
    pub model_version: String,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Named feature columns, one value per row
    pub features: RecordBatch,
}

/// Successful prediction response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Always `"success"`
    pub status: &'static str,
    /// Result of the first row
    pub prediction: PredictionResult,
    /// One result per input row
    pub predictions: Vec<PredictionResult>,
}

/// Error envelope shared by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `"error"`
    pub status: &'static str,
    /// Client-facing message
    pub error: String,
    /// Offending input fields, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

/// An error ready to be rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Map a pipeline error to a response, hiding internals unless `debug`
    #[must_use]
    pub fn from_error(err: &Error, debug: bool) -> Self {
        if err.is_client_error() {
            tracing::warn!(error = %err, "rejected prediction request");
            let fields = err.fields();
            return Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody {
                    status: "error",
                    error: INVALID_INPUT.to_string(),
                    fields: (!fields.is_empty()).then(|| fields.to_vec()),
                },
            };
        }

        tracing::error!(error = %err, "prediction failed");
        let error = if debug {
            err.to_string()
        } else {
            INTERNAL_ERROR.to_string()
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                status: "error",
                error,
                fields: None,
            },
        }
    }

    /// 404 for unknown routes
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                status: "error",
                error: "Not found".to_string(),
                fields: None,
            },
        }
    }

    /// 405 for a known route called with the wrong method
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            body: ErrorBody {
                status: "error",
                error: "Method not allowed".to_string(),
                fields: None,
            },
        }
    }

    /// HTTP status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Metric label for an error
fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::Validation(_) => "validation",
        Error::Schema(_) => "schema",
        Error::Feature { .. } => "feature",
        Error::ArtifactLoad { .. } => "artifact",
        Error::Prediction(_) => "prediction",
        Error::Io(_) | Error::Serialization(_) | Error::Internal(_) => "internal",
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/predict", post(predict).fallback(method_not_allowed))
        .route("/metrics", get(metrics).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.is_healthy().await;
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        model_loaded: true,
        version: SERVICE_VERSION,
        model_version: state.service.model_version().to_string(),
        uptime_secs: state.uptime_secs(),
    };
    (code, Json(body))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    state.metrics.record_request();

    match score(&state, payload) {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            state.metrics.record_error(error_kind(&err));
            ApiError::from_error(&err, state.debug).into_response()
        }
    }
}

/// Validate the request and run the pipeline
fn score(
    state: &AppState,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> risk_core::Result<PredictResponse> {
    let Json(request) = payload.map_err(|rejection| Error::Validation(rejection.body_text()))?;
    let batch = request.features;

    if batch.num_rows() > state.max_batch_rows {
        return Err(Error::Validation(format!(
            "batch has {} rows, limit is {}",
            batch.num_rows(),
            state.max_batch_rows
        )));
    }

    let scored = state.service.predict(&batch)?;
    state
        .metrics
        .record_batch(scored.results.len(), scored.preprocess_time, scored.inference_time);

    let prediction = *scored
        .first()
        .ok_or_else(|| Error::Internal("model returned no rows".to_string()))?;

    Ok(PredictResponse {
        status: "success",
        prediction,
        predictions: scored.results,
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(text) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response(),
        Err(err) => {
            ApiError::from_error(&Error::Internal(format!("metrics encoding: {err}")), state.debug)
                .into_response()
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Bind `address` and serve until Ctrl-C or SIGTERM
pub async fn serve(state: Arc<AppState>, address: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!(address = %listener.local_addr()?, "prediction server listening");

    state.set_status(AppStatus::Running).await;

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_state.set_status(AppStatus::ShuttingDown).await;
            tracing::info!("shutdown signal received, draining requests");
        })
        .await?;

    state.set_status(AppStatus::Stopped).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
