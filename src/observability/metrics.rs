//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define pool metrics (pool size, churn, lookup outcomes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `cluster_pool_connections` (gauge): connections currently pooled
//! - `cluster_pool_connections_created_total` (counter)
//! - `cluster_pool_connection_failures_total` (counter): factory failures
//! - `cluster_pool_connections_closed_total` (counter)
//! - `cluster_pool_lookups_total` (counter): successful registry lookups
//! - `cluster_pool_lookup_failures_total` (counter)
//!
//! # Design Decisions
//! - Handles are resolved once and passed into constructors (`PoolMetrics`)
//! - `PoolMetrics::noop()` for tests and embedders without a recorder

use std::net::SocketAddr;
use metrics::{Counter, Gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Metric handles for one pooled service.
#[derive(Clone)]
pub struct PoolMetrics {
    pooled_connections: Gauge,
    connections_created: Counter,
    connection_failures: Counter,
    connections_closed: Counter,
    lookups: Counter,
    lookup_failures: Counter,
}

impl PoolMetrics {
    /// Register handles labelled with the discovered service name.
    pub fn new(service: &str) -> Self {
        let service = service.to_string();
        Self {
            pooled_connections: metrics::gauge!("cluster_pool_connections", "service" => service.clone()),
            connections_created: metrics::counter!("cluster_pool_connections_created_total", "service" => service.clone()),
            connection_failures: metrics::counter!("cluster_pool_connection_failures_total", "service" => service.clone()),
            connections_closed: metrics::counter!("cluster_pool_connections_closed_total", "service" => service.clone()),
            lookups: metrics::counter!("cluster_pool_lookups_total", "service" => service.clone()),
            lookup_failures: metrics::counter!("cluster_pool_lookup_failures_total", "service" => service),
        }
    }

    pub fn noop() -> Self {
        Self {
            pooled_connections: Gauge::noop(),
            connections_created: Counter::noop(),
            connection_failures: Counter::noop(),
            connections_closed: Counter::noop(),
            lookups: Counter::noop(),
            lookup_failures: Counter::noop(),
        }
    }

    pub fn record_pool_size(&self, size: usize) {
        self.pooled_connections.set(size as f64);
    }

    pub fn record_created(&self) {
        self.connections_created.increment(1);
    }

    pub fn record_creation_failure(&self) {
        self.connection_failures.increment(1);
    }

    pub fn record_closed(&self, count: usize) {
        self.connections_closed.increment(count as u64);
    }

    pub fn record_lookup(&self, success: bool) {
        if success {
            self.lookups.increment(1);
        } else {
            self.lookup_failures.increment(1);
        }
    }
}

impl std::fmt::Debug for PoolMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolMetrics").finish_non_exhaustive()
    }
}
