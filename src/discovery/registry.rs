//! Service discovery registry contract.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Version of the registry state last observed by a caller.
///
/// Starts at zero; a registry never hands back an older index for the
/// same query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaitIndex(pub u64);

impl From<u64> for WaitIndex {
    fn from(idx: u64) -> Self {
        Self(idx)
    }
}

impl From<WaitIndex> for u64 {
    fn from(idx: WaitIndex) -> Self {
        idx.0
    }
}

impl std::fmt::Display for WaitIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologySnapshot {
    /// Node addresses (`host:port`) in registry order.
    pub nodes: Vec<String>,
    /// Index to pass to the next lookup.
    pub index: WaitIndex,
}

/// Errors that can occur while querying the registry.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The HTTP request could not be sent or its body not decoded.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("registry returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried no wait index.
    #[error("registry response has no index")]
    MissingIndex,

    /// The wait index header could not be parsed.
    #[error("invalid registry index: {0}")]
    InvalidIndex(String),

    /// The registry cannot be reached or refused the query.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// The lookup was cancelled before it completed.
    #[error("lookup cancelled")]
    Cancelled,
}

impl DiscoveryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DiscoveryError::Cancelled)
    }
}

/// A service discovery registry supporting blocking queries.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Return the nodes of `service` carrying all `tags`.
    ///
    /// May block until the registry state differs from `wait_index` or an
    /// internal wait elapses (then the same nodes and index are valid).
    /// Cancelling `cancel` makes the call return `DiscoveryError::Cancelled`.
    async fn lookup(
        &self,
        cancel: &CancellationToken,
        service: &str,
        tags: &[String],
        wait_index: WaitIndex,
    ) -> Result<TopologySnapshot, DiscoveryError>;
}
