//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): gate decisions by verdict
//! - `gate_cors_applied_total` (counter): responses that received CORS headers
//! - `gate_upstream_errors_total` (counter): failed upstream exchanges by kind
//! - `gate_upstream_duration_seconds` (histogram): upstream latency
//!
//! Updates are no-ops until a recorder is installed, so the gate and its
//! tests never depend on the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::security::Verdict;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(verdict: Verdict, cors_applied: bool) {
    counter!("gate_requests_total", "verdict" => verdict.as_str()).increment(1);
    if cors_applied {
        counter!("gate_cors_applied_total").increment(1);
    }
}

pub fn record_upstream(status: u16, start: Instant) {
    histogram!("gate_upstream_duration_seconds", "status" => status.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("gate_upstream_errors_total", "kind" => kind).increment(1);
}
