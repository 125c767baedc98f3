//! Observability subsystem: structured logs via `tracing`, metrics via
//! the Prometheus exporter.

pub mod metrics;
