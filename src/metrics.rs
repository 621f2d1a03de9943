//! Prometheus metrics for the prediction service.
//!
//! Only successful predictions are counted. Requests answered with 503, 422
//! or 500 leave every collector untouched.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Collectors exposed at `/metrics`
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Private registry so tests and multiple instances stay isolated
    registry: Registry,

    /// Successful prediction requests
    pub requests_total: IntCounter,

    /// Prediction latency in seconds, labelled by predicted class
    pub request_latency_seconds: HistogramVec,

    /// Predictions served, labelled by predicted class
    pub predictions_total: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounter::new(
            "api_requests_total",
            "Prediction requests answered successfully",
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_latency_seconds = HistogramVec::new(
            HistogramOpts::new("api_request_latency_seconds", "API request latency")
                .buckets(vec![0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["prediction"],
        )?;
        registry.register(Box::new(request_latency_seconds.clone()))?;

        let predictions_total = IntCounterVec::new(
            Opts::new("predictions_total", "Total predictions"),
            &["prediction"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_latency_seconds,
            predictions_total,
        })
    }

    /// Record one successful prediction.
    pub fn record_prediction(&self, class: u8, latency_secs: f64) {
        let label = class.to_string();
        self.requests_total.inc();
        self.predictions_total.with_label_values(&[&label]).inc();
        self.request_latency_seconds
            .with_label_values(&[&label])
            .observe(latency_secs);
    }

    /// Predictions served so far for one class
    pub fn predictions_for(&self, class: u8) -> u64 {
        self.predictions_total
            .with_label_values(&[&class.to_string()])
            .get()
    }

    /// Render all registered metrics in Prometheus text exposition format.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
