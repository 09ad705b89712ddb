//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `cloud_infra_reconciliations_total` - Total number of reconcile cycles
//! - `cloud_infra_reconciliation_errors_total` - Total number of reconcile errors
//! - `cloud_infra_reconcile_duration_seconds` - Duration of reconcile cycles
//! - `cloud_infra_requeues_total` - Requeues by trigger (timer, transient-error, rate-limit)
//! - `cloud_infra_provider_requests_total` - Provider API requests by method and path
//! - `cloud_infra_commit_conflicts_total` - Optimistic-concurrency conflicts on commit
//! - `cloud_infra_rate_limit_waits_total` - Creations deferred by the quota gate

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cloud_infra_reconciliations_total",
        "Total number of reconcile cycles",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cloud_infra_reconciliation_errors_total",
        "Total number of reconcile errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "cloud_infra_reconcile_duration_seconds",
            "Duration of reconcile cycles in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILE_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("cloud_infra_requeues_total", "Total requeues by trigger"),
        &["trigger"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static PROVIDER_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cloud_infra_provider_requests_total",
            "Total provider API requests by method and path",
        ),
        &["method", "path"],
    )
    .expect("Failed to create PROVIDER_REQUESTS_TOTAL metric - this should never happen")
});

static COMMIT_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cloud_infra_commit_conflicts_total",
        "Optimistic-concurrency conflicts on status commit",
    )
    .expect("Failed to create COMMIT_CONFLICTS_TOTAL metric - this should never happen")
});

static RATE_LIMIT_WAITS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cloud_infra_rate_limit_waits_total",
        "Instance creations deferred because the provider quota was exhausted",
    )
    .expect("Failed to create RATE_LIMIT_WAITS_TOTAL metric - this should never happen")
});

/// Register all metrics with the shared registry. Call once at startup.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILE_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROVIDER_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMMIT_CONFLICTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RATE_LIMIT_WAITS_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconcile_duration(seconds: f64) {
    RECONCILE_DURATION.observe(seconds);
}

pub fn increment_requeues(trigger: &str) {
    REQUEUES_TOTAL.with_label_values(&[trigger]).inc();
}

pub fn increment_provider_requests(method: &str, path: &str) {
    PROVIDER_REQUESTS_TOTAL
        .with_label_values(&[method, path])
        .inc();
}

pub fn increment_commit_conflicts() {
    COMMIT_CONFLICTS_TOTAL.inc();
}

pub fn increment_rate_limit_waits() {
    RATE_LIMIT_WAITS_TOTAL.inc();
}
