//! Prometheus metrics for monitoring.

use std::time::Duration;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

/// Label set for the error counter
type ErrorLabels = Vec<(String, String)>;

/// Metrics registry for the prediction service
#[derive(Debug)]
pub struct MetricsRegistry {
    /// Prometheus registry
    registry: Registry,
    /// Prediction requests received
    pub requests_total: Counter,
    /// Failed prediction requests, labelled by error kind
    pub request_errors_total: Family<ErrorLabels, Counter>,
    /// Rows scored successfully
    pub rows_scored_total: Counter,
    /// Preprocessing latency histogram (microseconds)
    pub preprocess_latency_us: Histogram,
    /// Model inference latency histogram (microseconds)
    pub inference_latency_us: Histogram,
    /// Row count of the most recent scored batch
    pub last_batch_rows: Gauge,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create a new metrics registry
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Counters
        let requests_total = Counter::default();
        registry.register(
            "credit_risk_requests",
            "Total number of prediction requests",
            requests_total.clone(),
        );

        let request_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "credit_risk_request_errors",
            "Prediction requests that failed",
            request_errors_total.clone(),
        );

        let rows_scored_total = Counter::default();
        registry.register(
            "credit_risk_rows_scored",
            "Total rows scored",
            rows_scored_total.clone(),
        );

        // Gauges
        let last_batch_rows = Gauge::default();
        registry.register(
            "credit_risk_last_batch_rows",
            "Rows in the most recent scored batch",
            last_batch_rows.clone(),
        );

        // 10us to ~5s
        let us_buckets: Vec<f64> = exponential_buckets(10.0, 2.0, 20).collect();

        let preprocess_latency_us = Histogram::new(us_buckets.iter().copied());
        registry.register(
            "credit_risk_preprocess_latency_us",
            "Preprocessing latency in microseconds",
            preprocess_latency_us.clone(),
        );

        let inference_latency_us = Histogram::new(us_buckets.iter().copied());
        registry.register(
            "credit_risk_inference_latency_us",
            "Model inference latency in microseconds",
            inference_latency_us.clone(),
        );

        Self {
            registry,
            requests_total,
            request_errors_total,
            rows_scored_total,
            preprocess_latency_us,
            inference_latency_us,
            last_batch_rows,
        }
    }

    /// Record an incoming prediction request
    pub fn record_request(&self) {
        self.requests_total.inc();
    }

    /// Record a failed request
    pub fn record_error(&self, kind: &str) {
        self.request_errors_total
            .get_or_create(&vec![("kind".to_string(), kind.to_string())])
            .inc();
    }

    /// Record a scored batch with its stage timings
    pub fn record_batch(&self, rows: usize, preprocess: Duration, inference: Duration) {
        self.rows_scored_total.inc_by(rows as u64);
        self.last_batch_rows.set(rows as i64);
        self.preprocess_latency_us
            .observe(preprocess.as_micros() as f64);
        self.inference_latency_us.observe(inference.as_micros() as f64);
    }

    /// Encode metrics for Prometheus scraping
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = MetricsRegistry::new();

        metrics.record_request();
        metrics.record_batch(3, Duration::from_micros(120), Duration::from_micros(40));

        let output = metrics.encode().unwrap();
        assert!(output.contains("credit_risk_requests_total 1"));
        assert!(output.contains("credit_risk_rows_scored_total 3"));
        assert!(output.contains("credit_risk_last_batch_rows 3"));
        assert!(output.contains("credit_risk_inference_latency_us"));
    }

    #[test]
    fn test_error_labels() {
        let metrics = MetricsRegistry::new();
        metrics.record_error("validation");
        metrics.record_error("validation");
        metrics.record_error("internal");

        let output = metrics.encode().unwrap();
        assert!(output.contains(r#"credit_risk_request_errors_total{kind="validation"} 2"#));
        assert!(output.contains(r#"credit_risk_request_errors_total{kind="internal"} 1"#));
    }
}
