//! Prometheus metrics for the notification-and-audit pipeline.
//!
//! - Dispatch metrics (dispatches by kind, per-channel attempt outcomes)
//! - Audit metrics (entries written, entries dropped)
//! - Realtime push metrics (active subscribers, published events)

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "harbor";

lazy_static! {
    /// Total notifications dispatched, by kind
    pub static ref DISPATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatches_total", METRIC_PREFIX),
        "Total notifications dispatched",
        &["kind"]
    ).unwrap();

    /// Dispatch latency, including channel fan-out
    pub static ref DISPATCH_DURATION: Histogram = register_histogram!(
        format!("{}_dispatch_duration_seconds", METRIC_PREFIX),
        "Dispatch latency in seconds, including channel fan-out",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    ).unwrap();

    /// Channel attempt outcomes
    pub static ref CHANNEL_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_channel_attempts_total", METRIC_PREFIX),
        "Channel delivery attempts by channel and outcome",
        &["channel", "outcome"]
    ).unwrap();

    /// Audit entries successfully persisted
    pub static ref AUDIT_ENTRIES_WRITTEN_TOTAL: IntCounter = register_int_counter!(
        format!("{}_audit_entries_written_total", METRIC_PREFIX),
        "Audit log entries successfully persisted"
    ).unwrap();

    /// Audit entries lost to persistence failures
    pub static ref AUDIT_ENTRIES_DROPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_audit_entries_dropped_total", METRIC_PREFIX),
        "Audit log entries dropped because persistence failed"
    ).unwrap();

    /// Active realtime push subscribers
    pub static ref PUSH_SUBSCRIBERS: IntGauge = register_int_gauge!(
        format!("{}_push_subscribers", METRIC_PREFIX),
        "Active realtime push subscriber connections"
    ).unwrap();

    /// Push events published to the hub
    pub static ref PUSH_EVENTS_PUBLISHED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_events_published_total", METRIC_PREFIX),
        "Push events published to the realtime hub"
    ).unwrap();
}

/// Helpers for dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_dispatch(kind: &str) {
        DISPATCHES_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_attempt(channel: &str, success: bool) {
        let outcome = if success { "ok" } else { "failed" };
        CHANNEL_ATTEMPTS_TOTAL
            .with_label_values(&[channel, outcome])
            .inc();
    }
}

/// Helpers for audit metrics
pub struct AuditMetrics;

impl AuditMetrics {
    pub fn record_written() {
        AUDIT_ENTRIES_WRITTEN_TOTAL.inc();
    }

    pub fn record_dropped() {
        AUDIT_ENTRIES_DROPPED_TOTAL.inc();
    }
}

/// Encode all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
