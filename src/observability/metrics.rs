//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_routes_registered_total` (counter): routes added to the table
//! - `registry_routes_unregistered_total` (counter): routes removed, labeled
//!   by reason (`unregister`, `evicted`)
//! - `registry_route_table_size` (gauge): current number of routes
//! - `registry_control_plane_available` (gauge): 1 when every route source
//!   reports healthy, 0 otherwise

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(error) => tracing::error!(%error, "Failed to install metrics exporter"),
    }
}

pub fn record_route_registered() {
    counter!("registry_routes_registered_total").increment(1);
}

pub fn record_route_unregistered(reason: &'static str) {
    counter!("registry_routes_unregistered_total", "reason" => reason).increment(1);
}

pub fn record_table_size(size: usize) {
    gauge!("registry_route_table_size").set(size as f64);
}

pub fn record_control_plane_available(available: bool) {
    gauge!("registry_control_plane_available").set(if available { 1.0 } else { 0.0 });
}
