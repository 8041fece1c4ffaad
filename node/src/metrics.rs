//! # Prometheus Metrics
//!
//! Operational metrics for the platform node, scraped at the `/metrics`
//! HTTP endpoint on the configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] so they do
//! not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are `Arc` internally) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct VaultMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total vaults created through the factory.
    pub vaults_created_total: IntCounter,
    /// Deposits accepted (direct and authorized).
    pub deposits_total: IntCounter,
    /// Deposits rejected with any error kind.
    pub deposits_rejected_total: IntCounter,
    /// Accepted deposits that came through the relayer rail.
    pub authorized_deposits_total: IntCounter,
    /// Payout claims paid out.
    pub claims_total: IntCounter,
    /// Dividend distribution events recorded.
    pub distributions_total: IntCounter,
    /// Vaults currently registered.
    pub registered_vaults: IntGauge,
    /// Histogram of deposit handling latency in seconds.
    pub deposit_latency_seconds: Histogram,
}

impl VaultMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("covault".into()), None)
            .expect("failed to create prometheus registry");

        let vaults_created_total = IntCounter::new(
            "vaults_created_total",
            "Total vaults created through the factory",
        )
        .expect("metric creation");
        registry
            .register(Box::new(vaults_created_total.clone()))
            .expect("metric registration");

        let deposits_total =
            IntCounter::new("deposits_total", "Deposits accepted, direct and authorized")
                .expect("metric creation");
        registry
            .register(Box::new(deposits_total.clone()))
            .expect("metric registration");

        let deposits_rejected_total = IntCounter::new(
            "deposits_rejected_total",
            "Deposits rejected with any error kind",
        )
        .expect("metric creation");
        registry
            .register(Box::new(deposits_rejected_total.clone()))
            .expect("metric registration");

        let authorized_deposits_total = IntCounter::new(
            "authorized_deposits_total",
            "Accepted deposits submitted through the relayer rail",
        )
        .expect("metric creation");
        registry
            .register(Box::new(authorized_deposits_total.clone()))
            .expect("metric registration");

        let claims_total = IntCounter::new("claims_total", "Payout claims paid out")
            .expect("metric creation");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("metric registration");

        let distributions_total = IntCounter::new(
            "distributions_total",
            "Dividend distribution events recorded",
        )
        .expect("metric creation");
        registry
            .register(Box::new(distributions_total.clone()))
            .expect("metric registration");

        let registered_vaults =
            IntGauge::new("registered_vaults", "Vaults currently registered")
                .expect("metric creation");
        registry
            .register(Box::new(registered_vaults.clone()))
            .expect("metric registration");

        let deposit_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "deposit_latency_seconds",
                "End-to-end deposit handling latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(deposit_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            vaults_created_total,
            deposits_total,
            deposits_rejected_total,
            authorized_deposits_total,
            claims_total,
            distributions_total,
            registered_vaults,
            deposit_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for VaultMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers via state.
pub type SharedMetrics = Arc<VaultMetrics>;

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
