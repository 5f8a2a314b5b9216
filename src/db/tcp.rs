//! TCP connection factory.
//!
//! Opens a plain TCP stream per node. The database protocol is spoken by
//! whoever borrows the stream; this module only owns the socket lifecycle.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;

use crate::db::connection::{Connection, ConnectionError, ConnectionFactory};

/// Creates [`TcpConnection`]s with a connect timeout.
#[derive(Debug, Clone)]
pub struct TcpConnectionFactory {
    connect_timeout: Duration,
}

impl TcpConnectionFactory {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

/// An open TCP stream to one node.
#[derive(Debug)]
pub struct TcpConnection {
    node: String,
    peer: SocketAddr,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpConnection {
    /// Node address this connection was created for.
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Exclusive access to the stream. `None` once the connection is closed.
    pub async fn stream(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.stream.lock().await
    }

    pub async fn is_closed(&self) -> bool {
        self.stream.lock().await.is_none()
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn close(&self) -> Result<(), ConnectionError> {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return Ok(());
        };

        stream.shutdown().await.map_err(|source| ConnectionError::Close {
            node: self.node.clone(),
            source,
        })
    }
}

#[async_trait]
impl ConnectionFactory for TcpConnectionFactory {
    type Conn = TcpConnection;

    async fn create(&self, node: &str) -> Result<TcpConnection, ConnectionError> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(node))
            .await
            .map_err(|_| ConnectionError::Timeout {
                node: node.to_string(),
                timeout: self.connect_timeout,
            })?
            .map_err(|source| ConnectionError::Connect {
                node: node.to_string(),
                source,
            })?;

        let connect_err = |source| ConnectionError::Connect {
            node: node.to_string(),
            source,
        };
        stream.set_nodelay(true).map_err(connect_err)?;
        let peer = stream.peer_addr().map_err(connect_err)?;

        tracing::debug!(node = %node, peer = %peer, "Opened TCP connection");

        Ok(TcpConnection {
            node: node.to_string(),
            peer,
            stream: Mutex::new(Some(stream)),
        })
    }
}
