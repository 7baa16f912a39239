//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sockjs_requests_total` (counter): dispatched requests by path kind and status
//! - `sockjs_config_reloads_total` (counter): applied configuration updates

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched SockJS request.
pub fn record_request(kind: &'static str, status: u16) {
    counter!("sockjs_requests_total", "kind" => kind, "status" => status.to_string()).increment(1);
}

/// Record an applied configuration update.
pub fn record_config_reload() {
    counter!("sockjs_config_reloads_total").increment(1);
}
