//! End-to-end: prepare from a raw source body, train, then serve.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use heart_disease_pipeline::api::{build_router, AppState};
use heart_disease_pipeline::config::AppConfig;
use heart_disease_pipeline::data::parse_raw;
use heart_disease_pipeline::models::tracking::ExperimentTracker;
use heart_disease_pipeline::models::ArtifactStore;
use heart_disease_pipeline::pipeline::{prepare_from_raw, run_training};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

/// Raw source text in the header-less Cleveland layout. Diagnosis levels
/// 1-4 all mean disease; every tenth row has a missing `ca`.
fn raw_source(n: usize) -> String {
    let mut body = String::new();
    for i in 0..n {
        let sick = i % 3 == 0;
        let wobble = ((i * 37) % 17) as f64;
        let label = if sick { 1 + i % 4 } else { 0 };
        let ca = if i % 10 == 7 {
            "?".to_string()
        } else if sick {
            "2.0".to_string()
        } else {
            "0.0".to_string()
        };
        body.push_str(&format!(
            "{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{},{:.1},{}\n",
            if sick { 60.0 } else { 45.0 } + wobble,
            (i % 2) as f64,
            if sick { 4.0 } else { 2.0 },
            120.0 + wobble * 2.0,
            200.0 + wobble * 3.0,
            ((i / 2) % 2) as f64,
            (i % 3) as f64,
            if sick { 130.0 } else { 165.0 } - wobble,
            if sick { 1.0 } else { 0.0 },
            if sick { 2.0 } else { 0.5 } + wobble / 17.0,
            (1 + i % 3) as f64,
            ca,
            if sick { 7.0 } else { 3.0 },
            label,
        ));
    }
    body
}

fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.data.raw_path = root.join("data/heart_disease_raw.csv");
    config.data.clean_path = root.join("data/heart_disease_clean.csv");
    config.data.reports_dir = root.join("reports");
    config.models.models_dir = root.join("models");
    config.tracking.tracking_dir = root.join("mlruns");
    config.training.forest.n_estimators = 15;
    config
}

fn sample_request() -> serde_json::Value {
    serde_json::json!({
        "age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1,
        "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
        "ca": 0, "thal": 1
    })
}

fn post_predict(body: &serde_json::Value) -> Request<Body> {
    Request::post("/predict")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_prepare_train_serve() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let raw = parse_raw(&raw_source(150)).unwrap();
    let report = prepare_from_raw(&config.data, &raw).unwrap();
    assert_eq!(report.raw_rows, 150);
    assert_eq!(report.clean_rows, 135);
    assert!(report.summary_path.exists());
    assert!(config.data.clean_path.exists());

    let outcome = run_training(&config).unwrap();
    let store = ArtifactStore::new(&config.models.models_dir);
    assert!(store.scaler_path().exists());
    assert!(store.model_path("logistic_regression").exists());
    assert!(store.model_path("random_forest").exists());
    assert_eq!(store.read_best_model().unwrap(), outcome.best);

    let runs = ExperimentTracker::new(&config.tracking.tracking_dir, "heart_disease_prediction")
        .runs()
        .unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs.iter().filter(|r| r.selected).count(), 1);

    let state = Arc::new(AppState::from_config(&config).unwrap());
    assert!(state.is_ready());

    let resp = build_router(state.clone())
        .oneshot(post_predict(&sample_request()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["model_used"], outcome.best.identifier());
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.5..=1.0).contains(&confidence));

    let mut out_of_range = sample_request();
    out_of_range["age"] = serde_json::json!(150);
    let resp = build_router(state.clone())
        .oneshot(post_predict(&out_of_range))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(state.metrics.requests_total.get(), 1);
}

#[tokio::test]
async fn test_training_without_dataset_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    assert!(run_training(&config).is_err());
    assert!(!config.models.models_dir.exists());
    assert!(!config.tracking.tracking_dir.exists());
}

#[tokio::test]
async fn test_single_class_dataset_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let healthy_only: String = raw_source(60)
        .lines()
        .filter(|line| line.ends_with(",0"))
        .map(|line| format!("{line}\n"))
        .collect();
    let raw = parse_raw(&healthy_only).unwrap();
    prepare_from_raw(&config.data, &raw).unwrap();

    assert!(run_training(&config).is_err());
    assert!(!ArtifactStore::new(&config.models.models_dir)
        .best_model_path()
        .exists());
}

#[tokio::test]
async fn test_serve_without_artifacts_is_unready() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let state = Arc::new(AppState::from_config(&config).unwrap());
    assert!(!state.is_ready());

    let resp = build_router(state.clone())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = build_router(state.clone())
        .oneshot(post_predict(&sample_request()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = build_router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
