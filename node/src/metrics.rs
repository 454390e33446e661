//! # Prometheus Metrics
//!
//! Token issuance and verification counters plus per-endpoint latency,
//! scraped at `/metrics` on the metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] with the
//! `claimseal` prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Outcome label for a token that matched.
pub const OUTCOME_VALID: &str = "valid";
/// Outcome label for a well-formed token that did not match.
pub const OUTCOME_MISMATCH: &str = "mismatch";
/// Outcome label for input that could not be checked at all.
pub const OUTCOME_REJECTED: &str = "rejected";

/// Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Tokens issued since startup.
    pub tokens_issued_total: IntCounter,
    /// Verifications by outcome (`valid`, `mismatch`, `rejected`).
    pub verifications_total: IntCounterVec,
    /// Handler latency in seconds, by endpoint.
    pub request_duration_seconds: HistogramVec,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("claimseal".into()), None)
            .expect("failed to create prometheus registry");

        let tokens_issued_total =
            IntCounter::new("tokens_issued_total", "Total number of tokens issued")
                .expect("metric creation");
        registry
            .register(Box::new(tokens_issued_total.clone()))
            .expect("metric registration");

        let verifications_total = IntCounterVec::new(
            Opts::new(
                "verifications_total",
                "Total number of token verifications by outcome",
            ),
            &["outcome"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(verifications_total.clone()))
            .expect("metric registration");

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_seconds",
                "Handler latency in seconds, by endpoint",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
            &["endpoint"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(request_duration_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            tokens_issued_total,
            verifications_total,
            request_duration_seconds,
        }
    }

    /// Counts one verification with the given outcome label.
    pub fn record_verification(&self, outcome: &str) {
        self.verifications_total.with_label_values(&[outcome]).inc();
    }

    /// Records how long a handler took.
    pub fn observe_latency(&self, endpoint: &str, started: std::time::Instant) {
        self.request_duration_seconds
            .with_label_values(&[endpoint])
            .observe(started.elapsed().as_secs_f64());
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
