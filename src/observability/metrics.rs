//! Metrics collection and exposition.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus exporter and its scrape endpoint.
pub fn init_exporter(addr: SocketAddr) {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus recorder");

    tracing::info!("Metrics server listening on http://{}", addr);
}

/// Record how a client request was answered.
pub fn record_reply(outcome: &'static str) {
    counter!("proxy_replies_total", "outcome" => outcome).increment(1);
}

/// Record a cache lookup outcome.
pub fn record_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("proxy_cache_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a completed cache insertion.
pub fn record_cache_store(entry_bytes: usize) {
    counter!("proxy_cache_stores_total").increment(1);
    counter!("proxy_cache_stored_bytes_total").increment(entry_bytes as u64);
}

/// Record evictions performed to make room for an insertion.
pub fn record_cache_evictions(count: u64) {
    counter!("proxy_cache_evictions_total").increment(count);
}

/// Update the cache size gauge.
pub fn record_cache_size(bytes: usize) {
    gauge!("proxy_cache_size_bytes").set(bytes as f64);
}
