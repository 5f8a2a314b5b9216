//! Published cluster topology.
//!
//! The connection pool writes the current node list here after every
//! reconciliation; introspection consumers only read it.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;

/// One database node as seen by configuration consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterNode {
    pub host: String,
    pub port: u16,
}

impl ClusterNode {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Thread-safe, atomically replaced list of cluster nodes.
#[derive(Debug)]
pub struct ClusterNodeStore {
    nodes: ArcSwap<Vec<ClusterNode>>,
}

impl ClusterNodeStore {
    pub fn new() -> Self {
        Self {
            nodes: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Snapshot of the published nodes, in topology order.
    pub fn get(&self) -> Vec<ClusterNode> {
        self.nodes.load().as_ref().clone()
    }

    /// Replace the published nodes.
    pub fn set(&self, nodes: Vec<ClusterNode>) {
        self.nodes.store(Arc::new(nodes));
    }
}

impl Default for ClusterNodeStore {
    fn default() -> Self {
        Self::new()
    }
}
