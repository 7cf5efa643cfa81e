//! Prometheus Metrics Module
//!
//! Provides process-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Open realtime connections and non-empty rooms
//! - Dispatched events by name and recipients per event
//! - Per-connection deliveries by outcome
//! - Pending typing timers

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "chat_realtime";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Open realtime connections
pub static CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("connections_active", "Number of open realtime connections").namespace(NAMESPACE),
    )
    .expect("Failed to create CONNECTIONS_ACTIVE metric")
});

/// Rooms with at least one member
pub static ROOMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("rooms_active", "Number of rooms with at least one member").namespace(NAMESPACE),
    )
    .expect("Failed to create ROOMS_ACTIVE metric")
});

/// Pending typing timers
pub static TYPING_TIMERS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("typing_timers_active", "Number of pending typing timers").namespace(NAMESPACE),
    )
    .expect("Failed to create TYPING_TIMERS_ACTIVE metric")
});

/// Dispatched events by event name
pub static EVENTS_DISPATCHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("events_dispatched_total", "Total number of dispatched events")
            .namespace(NAMESPACE),
        &["event"],
    )
    .expect("Failed to create EVENTS_DISPATCHED_TOTAL metric")
});

/// Recipients per dispatched event
pub static EVENT_RECIPIENTS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0];
    HistogramVec::new(
        HistogramOpts::new("event_recipients", "Connections an event was queued for")
            .namespace(NAMESPACE)
            .buckets(buckets),
        &["event"],
    )
    .expect("Failed to create EVENT_RECIPIENTS metric")
});

/// Per-connection deliveries by outcome
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("deliveries_total", "Total number of per-connection deliveries")
            .namespace(NAMESPACE),
        &["outcome"], // "queued", "dropped"
    )
    .expect("Failed to create DELIVERIES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(CONNECTIONS_ACTIVE.clone()),
        Box::new(ROOMS_ACTIVE.clone()),
        Box::new(TYPING_TIMERS_ACTIVE.clone()),
        Box::new(EVENTS_DISPATCHED_TOTAL.clone()),
        Box::new(EVENT_RECIPIENTS.clone()),
        Box::new(DELIVERIES_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::error!(error = %e, "Failed to register metric");
        }
    }
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to update the open connection count
pub fn set_connections_active(count: usize) {
    CONNECTIONS_ACTIVE.set(count as i64);
}

/// Helper to update the non-empty room count
pub fn set_rooms_active(count: usize) {
    ROOMS_ACTIVE.set(count as i64);
}

/// Helper to update the pending typing timer count
pub fn set_typing_timers(count: usize) {
    TYPING_TIMERS_ACTIVE.set(count as i64);
}

/// Helper to record one dispatched event
pub fn record_event_dispatched(event: &str, recipients: usize) {
    EVENTS_DISPATCHED_TOTAL.with_label_values(&[event]).inc();
    EVENT_RECIPIENTS
        .with_label_values(&[event])
        .observe(recipients as f64);
}

/// Helper to record one per-connection delivery
pub fn record_delivery(outcome: &str) {
    DELIVERIES_TOTAL.with_label_values(&[outcome]).inc();
}
