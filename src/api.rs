//! HTTP prediction service.
//!
//! Routes:
//! - `GET /` service banner
//! - `GET /health` readiness of the loaded model
//! - `POST /predict` classify one patient record
//! - `GET /metrics` Prometheus exposition
//!
//! The model is loaded once at startup. A failed load leaves the service
//! permanently unready: `/health` and `/predict` answer 503 while the other
//! routes keep working.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::{PatientFeatures, PredictionResponse};
use crate::validation::{validate, ValidationErrors};

/// Whether a model is available for inference
pub enum ModelState {
    Ready(InferenceEngine),
    Unready { reason: String },
}

/// Shared, read-only service context
pub struct AppState {
    pub metrics: ServiceMetrics,
    pub model: ModelState,
}

impl AppState {
    pub fn new(model: ModelState) -> Result<Self, prometheus::Error> {
        Ok(Self {
            metrics: ServiceMetrics::new()?,
            model,
        })
    }

    /// Build the context from configuration, loading the committed model.
    ///
    /// A load failure is logged and yields an unready state; only metrics
    /// registration errors are returned.
    pub fn from_config(config: &AppConfig) -> Result<Self, prometheus::Error> {
        let model = match InferenceEngine::from_models_dir(&config.models.models_dir) {
            Ok(engine) => {
                info!(model_used = %engine.model_used(), "Model loaded, service ready");
                ModelState::Ready(engine)
            }
            Err(e) => {
                let reason = format!("{e:#}");
                error!(error = %reason, "Failed to load model, service is unready");
                ModelState::Unready { reason }
            }
        };
        Self::new(model)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.model, ModelState::Ready(_))
    }

    fn engine(&self) -> Result<&InferenceEngine, ApiError> {
        match &self.model {
            ModelState::Ready(engine) => Ok(engine),
            ModelState::Unready { .. } => Err(ApiError::NotReady),
        }
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Model not loaded")]
    NotReady,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("prediction failed: {0:#}")]
    Inference(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "detail": "Model not loaded" }),
            ),
            ApiError::InvalidBody(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "detail": [{ "message": message }] }),
            ),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "detail": errors.violations }),
            ),
            ApiError::Inference(e) => {
                error!(error = %format!("{e:#}"), "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": "Prediction failed" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Heart Disease Prediction API",
        "status": "running",
    }))
}

async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine()?;
    Ok(Json(json!({ "status": "healthy", "model_loaded": true })))
}

/// Readiness first, then body shape, then bounds, then inference.
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let start = Instant::now();
    let engine = state.engine()?;

    let patient: PatientFeatures = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidBody(e.to_string()))?;
    if let Err(errors) = validate(&patient) {
        warn!(fields = %errors, "Rejected prediction request");
        return Err(errors.into());
    }

    let prediction = engine.predict(&patient).map_err(ApiError::Inference)?;
    state
        .metrics
        .record_prediction(prediction.class, start.elapsed().as_secs_f64());

    info!(
        prediction = prediction.class,
        probability = prediction.positive_probability,
        confidence = prediction.confidence,
        risk_level = %prediction.risk_level,
        "Prediction served"
    );
    Ok(Json(prediction.to_response(engine.model_used().identifier())))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.gather_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to gather metrics: {e}"),
        )
            .into_response(),
    }
}
