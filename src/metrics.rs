// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for dyndnsd
//!
//! This module provides metrics for monitoring the update endpoint:
//! - HTTP request metrics (count, duration, status codes)
//! - Zone update metrics (updates vs. creations, success vs. error)
//! - Zone file health (skipped records, serial overflows, current serial)
//! - Post-update command executions

use lazy_static::lazy_static;
use prometheus::{
    opts, register_counter, register_counter_vec, register_gauge, register_histogram_vec,
    Counter, CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};

lazy_static! {
    /// HTTP request counter by method, path, and status code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "dyndnsd_http_requests_total",
            "Total number of HTTP requests processed"
        ),
        &["method", "path", "status"]
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration histogram
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "dyndnsd_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Zone updates by mode (update/create) and result
    pub static ref ZONE_UPDATES_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "dyndnsd_zone_updates_total",
            "Total number of zone file updates"
        ),
        &["mode", "result"]
    )
    .expect("Failed to create ZONE_UPDATES_TOTAL metric");

    /// Malformed zone file entries skipped while reading
    pub static ref RECORD_PARSE_ERRORS_TOTAL: Counter = register_counter!(
        opts!(
            "dyndnsd_record_parse_errors_total",
            "Total number of malformed zone file entries skipped"
        )
    )
    .expect("Failed to create RECORD_PARSE_ERRORS_TOTAL metric");

    /// Updates whose SOA serial could not be advanced
    pub static ref SERIAL_OVERFLOWS_TOTAL: Counter = register_counter!(
        opts!(
            "dyndnsd_serial_overflows_total",
            "Total number of updates that left the SOA serial unchanged"
        )
    )
    .expect("Failed to create SERIAL_OVERFLOWS_TOTAL metric");

    /// Current SOA serial of the managed zone
    pub static ref ZONE_SERIAL: Gauge = register_gauge!(
        opts!(
            "dyndnsd_zone_serial",
            "SOA serial of the managed zone after the last update"
        )
    )
    .expect("Failed to create ZONE_SERIAL metric");

    /// Post-update command executions by result
    pub static ref HOOK_EXECUTIONS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "dyndnsd_hook_executions_total",
            "Total number of post-update command executions"
        ),
        &["result"]
    )
    .expect("Failed to create HOOK_EXECUTIONS_TOTAL metric");

    /// Application info metric
    pub static ref APP_INFO: CounterVec = register_counter_vec!(
        opts!(
            "dyndnsd_app_info",
            "Application information"
        ),
        &["version"]
    )
    .expect("Failed to create APP_INFO metric");
}

/// Initialize metrics with application info
pub fn init_metrics() {
    APP_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .inc();
}

/// Generate metrics output in Prometheus format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a zone update; `created` is true when a new zone was synthesized
pub fn record_zone_update(created: bool, success: bool) {
    let mode = if created { "create" } else { "update" };
    let result = if success { "success" } else { "error" };
    ZONE_UPDATES_TOTAL.with_label_values(&[mode, result]).inc();
}

/// Record a skipped zone file entry
pub fn record_parse_error() {
    RECORD_PARSE_ERRORS_TOTAL.inc();
}

/// Record an update that could not advance the serial
pub fn record_serial_overflow() {
    SERIAL_OVERFLOWS_TOTAL.inc();
}

/// Publish the zone's current serial
pub fn set_zone_serial(serial: u32) {
    ZONE_SERIAL.set(f64::from(serial));
}

/// Record a post-update command execution
pub fn record_hook_execution(success: bool) {
    let result = if success { "success" } else { "error" };
    HOOK_EXECUTIONS_TOTAL.with_label_values(&[result]).inc();
}
