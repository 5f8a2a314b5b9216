//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Manager::get_connection()
//!     → db::ConnectionPool::connections() (ordered snapshot)
//!     → Balancer::next(snapshot):
//!         - round_robin.rs (rotate through connections)
//!     → Return connection or BalancerError::NoNodesAvailable
//! ```
//!
//! # Design Decisions
//! - Balancer never sees the pool; it only receives an ordered slice
//! - Selection state (the cursor) lives in the balancer, not in the pool
//! - An empty slice is a transient condition reported to the caller

use std::sync::Arc;
use thiserror::Error;

pub mod round_robin;

pub use round_robin::RoundRobin;

/// Errors returned by a balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BalancerError {
    /// The connection list handed to the balancer was empty.
    #[error("no nodes available")]
    NoNodesAvailable,
}

/// Picks the connection a caller should use next.
pub trait Balancer<C>: Send + Sync {
    /// Select the next connection from an ordered list.
    fn next(&self, conns: &[Arc<C>]) -> Result<Arc<C>, BalancerError>;
}
