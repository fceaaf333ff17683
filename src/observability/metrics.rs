//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): HTTP requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): HTTP latency
//! - `gateway_rpc_calls_total` (counter): RPC calls by method and outcome
//! - `gateway_rpc_duration_seconds` (histogram): RPC latency by method
//! - `gateway_submissions_total` (counter): pipeline outcomes by error kind
//! - `gateway_events_decoded_total` (counter): decoded logs by event name
//! - `gateway_chain_health` (gauge): 1=reachable, 0=unreachable
//!
//! # Design Decisions
//! - Recording is a no-op until the Prometheus recorder is installed
//! - Labels never carry addresses or hashes (unbounded cardinality)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels[..2])
        .record(start.elapsed().as_secs_f64());
}

/// Record one RPC call attempt against the ledger.
pub fn record_rpc_call(method: &'static str, ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("gateway_rpc_calls_total", "method" => method, "outcome" => outcome).increment(1);
    histogram!("gateway_rpc_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one pipeline invocation.
pub fn record_submission(operation: &'static str, outcome: &'static str) {
    counter!(
        "gateway_submissions_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a decoded event log.
pub fn record_event_decoded(event: &'static str) {
    counter!("gateway_events_decoded_total", "event" => event).increment(1);
}

/// Record chain reachability.
pub fn record_chain_health(healthy: bool) {
    gauge!("gateway_chain_health").set(if healthy { 1.0 } else { 0.0 });
}
