//! Metrics collection and exposition.
//!
//! # Metrics
//! - `compile_server_requests_total` (counter): requests by method, route, status
//! - `compile_server_request_duration_seconds` (histogram): request latency
//! - `compile_server_compilations_total` (counter): compile runs by config, outcome
//! - `compile_server_compile_duration_seconds` (histogram): compiler latency
//! - `compile_server_cache_entries` (gauge): cached byproduct count
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! library users and tests pay nothing for it.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one finished HTTP request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "compile_server_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "compile_server_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one finished compiler run.
pub fn record_compilation(config_id: &str, outcome: &str, start: Instant) {
    counter!(
        "compile_server_compilations_total",
        "config" => config_id.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "compile_server_compile_duration_seconds",
        "config" => config_id.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the number of cached byproduct entries.
pub fn record_cache_size(entries: usize) {
    gauge!("compile_server_cache_entries").set(entries as f64);
}
