//! # Prometheus Metrics
//!
//! Exposes operational metrics for the registry node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`]
//! namespaced `sidereal` so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of ownership challenges issued.
    pub challenges_issued_total: IntCounter,
    /// Total number of stars accepted onto the chain.
    pub stars_registered_total: IntCounter,
    /// Total number of star submissions rejected during ownership verification.
    pub verification_failures_total: IntCounter,
    /// Total number of blocks appended, genesis included.
    pub blocks_appended_total: IntCounter,
    /// Current chain height. -1 means the chain has no genesis yet.
    pub chain_height: IntGauge,
    /// Number of faults found by the most recent post-append sweep.
    pub sweep_faults: IntGauge,
    /// Histogram of star-submission latency in seconds (verify + append).
    pub submit_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("sidereal".into()), None)
            .expect("failed to create prometheus registry");

        let challenges_issued_total = IntCounter::new(
            "challenges_issued_total",
            "Total number of ownership challenges issued",
        )
        .expect("metric creation");
        registry
            .register(Box::new(challenges_issued_total.clone()))
            .expect("metric registration");

        let stars_registered_total = IntCounter::new(
            "stars_registered_total",
            "Total number of stars accepted onto the chain",
        )
        .expect("metric creation");
        registry
            .register(Box::new(stars_registered_total.clone()))
            .expect("metric registration");

        let verification_failures_total = IntCounter::new(
            "verification_failures_total",
            "Total number of star submissions rejected during ownership verification",
        )
        .expect("metric creation");
        registry
            .register(Box::new(verification_failures_total.clone()))
            .expect("metric registration");

        let blocks_appended_total = IntCounter::new(
            "blocks_appended_total",
            "Total number of blocks appended to the chain, genesis included",
        )
        .expect("metric creation");
        registry
            .register(Box::new(blocks_appended_total.clone()))
            .expect("metric registration");

        let chain_height = IntGauge::new(
            "chain_height",
            "Current chain height (-1 when no genesis exists)",
        )
        .expect("metric creation");
        registry
            .register(Box::new(chain_height.clone()))
            .expect("metric registration");

        let sweep_faults = IntGauge::new(
            "sweep_faults",
            "Faults found by the most recent post-append validation sweep",
        )
        .expect("metric creation");
        registry
            .register(Box::new(sweep_faults.clone()))
            .expect("metric registration");

        let submit_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "submit_latency_seconds",
                "End-to-end star submission latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(submit_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            challenges_issued_total,
            stars_registered_total,
            verification_failures_total,
            blocks_appended_total,
            chain_height,
            sweep_faults,
            submit_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

/// Shared metrics state passed to axum handlers via extension.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
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
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
