//! Pull-based observability for the prediction service
//!
//! Counters live in a private Prometheus registry rendered at `/metrics`.

pub mod metrics;

pub use metrics::ServiceMetrics;
