//! Prometheus metrics for the prediction service
//!
//! All metrics use the `santander_` prefix.

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the prediction service
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Arc<Registry>,
    /// Requests by route and outcome
    pub requests_total: IntCounterVec,
    /// Rows returned in prediction files
    pub rows_predicted_total: IntCounter,
    /// Feature cells filled in by the imputer
    pub imputed_cells_total: IntCounter,
    /// Time spent parsing, scoring and encoding an upload
    pub inference_latency_seconds: Histogram,
}

impl ServiceMetrics {
    /// Create a new instance with every metric registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("santander_requests_total", "Requests by route and outcome"),
            &["route", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let rows_predicted_total = IntCounter::with_opts(Opts::new(
            "santander_rows_predicted_total",
            "Rows returned in prediction files",
        ))?;
        registry.register(Box::new(rows_predicted_total.clone()))?;

        let imputed_cells_total = IntCounter::with_opts(Opts::new(
            "santander_imputed_cells_total",
            "Missing feature cells imputed before inference",
        ))?;
        registry.register(Box::new(imputed_cells_total.clone()))?;

        let inference_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "santander_inference_latency_seconds",
                "Upload parse, inference and encode latency in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(inference_latency_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            rows_predicted_total,
            imputed_cells_total,
            inference_latency_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_requests(&self, route: &str, outcome: &str) {
        self.requests_total.with_label_values(&[route, outcome]).inc();
    }

    /// Record a successful prediction request
    pub fn observe_prediction(&self, rows: usize, imputed_cells: usize, latency: f64) {
        self.rows_predicted_total.inc_by(rows as u64);
        self.imputed_cells_total.inc_by(imputed_cells as u64);
        self.inference_latency_seconds.observe(latency);
    }
}
