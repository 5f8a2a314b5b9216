//! Connection and connection factory contracts.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while opening or closing a node connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {node}: {source}")]
    Connect {
        node: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {node} timed out after {timeout:?}")]
    Timeout { node: String, timeout: Duration },

    #[error("failed to close connection to {node}: {source}")]
    Close {
        node: String,
        #[source]
        source: std::io::Error,
    },
}

/// A live, stateful handle to one node.
///
/// Handles may be used by several callers at once; serializing access to a
/// single connection is up to the implementation.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Release the underlying resources.
    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Opens connections to node addresses.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    type Conn: Connection;

    /// Create a connection to `node` (`host:port`).
    async fn create(&self, node: &str) -> Result<Self::Conn, ConnectionError>;
}
