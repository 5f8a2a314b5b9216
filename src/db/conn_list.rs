//! Pool of open connections keyed by node address.
//!
//! # Responsibilities
//! - Reconcile open connections against a target node list
//! - Hand out ordered snapshots of the pooled connections
//! - Publish the applied node list for introspection
//! - Close everything on shutdown
//!
//! # Reconciliation
//! ```text
//! target \ pooled  → factory.create() (failures logged and skipped)
//! pooled \ target  → removed from the map, then closed
//! pooled ∩ target  → untouched
//! ```
//! New connections are opened without holding the map lock; the map and
//! node order are then swapped in under one write lock, so readers see
//! either the old or the new pool, never a mix.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::{ClusterNode, ClusterNodeStore};
use crate::db::connection::{Connection, ConnectionFactory};
use crate::observability::PoolMetrics;

/// Receiver of topology updates.
#[async_trait]
pub trait NodeList: Send + Sync {
    /// Make the pool match `nodes`.
    async fn set_nodes(&self, nodes: Vec<String>);

    /// Addresses that currently hold a connection, in topology order.
    fn pooled_nodes(&self) -> Vec<String>;
}

struct PoolState<C> {
    nodes: Vec<String>,
    conns: HashMap<String, Arc<C>>,
}

impl<C> Default for PoolState<C> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            conns: HashMap::new(),
        }
    }
}

/// Open connections for the current topology.
pub struct ConnectionPool<F: ConnectionFactory> {
    factory: F,
    target: Arc<ClusterNodeStore>,
    metrics: PoolMetrics,
    state: RwLock<PoolState<F::Conn>>,
    /// Serializes `set_nodes` and `close`; held across connection I/O.
    writer: tokio::sync::Mutex<()>,
}

impl<F: ConnectionFactory> ConnectionPool<F> {
    pub fn new(factory: F, target: Arc<ClusterNodeStore>, metrics: PoolMetrics) -> Self {
        Self {
            factory,
            target,
            metrics,
            state: RwLock::new(PoolState::default()),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// Reconcile the pool against `nodes`.
    ///
    /// Connections for addresses kept in `nodes` are reused as-is. Removed
    /// addresses are closed before this returns.
    pub async fn set_nodes(&self, nodes: Vec<String>) {
        let _writer = self.writer.lock().await;

        let wanted: HashSet<&str> = nodes.iter().map(String::as_str).collect();
        let missing: Vec<String> = {
            let state = self.state.read();
            let mut seen = HashSet::new();
            nodes
                .iter()
                .filter(|node| !state.conns.contains_key(node.as_str()))
                .filter(|node| seen.insert(node.as_str()))
                .cloned()
                .collect()
        };

        let mut created = Vec::with_capacity(missing.len());
        let mut failed = 0usize;
        for node in missing {
            match self.factory.create(&node).await {
                Ok(conn) => {
                    self.metrics.record_created();
                    created.push((node, Arc::new(conn)));
                }
                Err(e) => {
                    failed += 1;
                    self.metrics.record_creation_failure();
                    tracing::error!(node = %node, error = %e, "Failed to create database connection");
                }
            }
        }

        let added = created.len();
        let (removed, pooled) = {
            let mut state = self.state.write();
            state.conns.extend(created);

            let stale: Vec<String> = state
                .conns
                .keys()
                .filter(|node| !wanted.contains(node.as_str()))
                .cloned()
                .collect();
            let removed: Vec<(String, Arc<F::Conn>)> = stale
                .into_iter()
                .filter_map(|node| state.conns.remove(&node).map(|conn| (node, conn)))
                .collect();

            state.nodes = nodes.clone();
            (removed, state.conns.len())
        };

        self.publish(&nodes);
        self.metrics.record_pool_size(pooled);

        if added > 0 || failed > 0 || !removed.is_empty() {
            tracing::info!(
                nodes = nodes.len(),
                added,
                failed,
                removed = removed.len(),
                pooled,
                "Connection pool reconciled"
            );
        } else {
            tracing::debug!(nodes = nodes.len(), pooled, "Connection pool unchanged");
        }

        self.close_all(removed).await;
    }

    /// Pooled connections ordered by the last applied node list.
    pub fn connections(&self) -> Vec<Arc<F::Conn>> {
        let state = self.state.read();
        state
            .nodes
            .iter()
            .filter_map(|node| state.conns.get(node).cloned())
            .collect()
    }

    /// Connection for one node, if pooled.
    pub fn connection(&self, node: &str) -> Option<Arc<F::Conn>> {
        self.state.read().conns.get(node).cloned()
    }

    /// Close every connection and empty the pool.
    pub async fn close(&self) {
        let _writer = self.writer.lock().await;

        let drained: Vec<(String, Arc<F::Conn>)> = {
            let mut state = self.state.write();
            let old = std::mem::take(&mut *state);
            old.conns.into_iter().collect()
        };

        self.target.set(Vec::new());
        self.metrics.record_pool_size(0);
        tracing::info!(closing = drained.len(), "Closing connection pool");

        self.close_all(drained).await;
    }

    async fn close_all(&self, conns: Vec<(String, Arc<F::Conn>)>) {
        let count = conns.len();
        for (node, conn) in conns {
            if let Err(e) = conn.close().await {
                tracing::error!(node = %node, error = %e, "Failed to close database connection");
            }
        }
        if count > 0 {
            self.metrics.record_closed(count);
        }
    }

    fn publish(&self, nodes: &[String]) {
        let published = nodes.iter().map(|node| split_host_port(node)).collect();
        self.target.set(published);
    }
}

#[async_trait]
impl<F: ConnectionFactory> NodeList for ConnectionPool<F> {
    async fn set_nodes(&self, nodes: Vec<String>) {
        ConnectionPool::set_nodes(self, nodes).await
    }

    fn pooled_nodes(&self) -> Vec<String> {
        let state = self.state.read();
        state
            .nodes
            .iter()
            .filter(|node| state.conns.contains_key(node.as_str()))
            .cloned()
            .collect()
    }
}

/// Split `host:port`; a missing or unparseable port becomes 0.
fn split_host_port(node: &str) -> ClusterNode {
    match node.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => ClusterNode::new(host, port),
            Err(e) => {
                tracing::warn!(node = %node, error = %e, "Failed to split host/port of node");
                ClusterNode::new(host, 0)
            }
        },
        None => ClusterNode::new(node, 0),
    }
}
