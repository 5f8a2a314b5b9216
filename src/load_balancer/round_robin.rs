//! Round-robin load balancing strategy.

use std::sync::Arc;
use parking_lot::Mutex;
use crate::load_balancer::{Balancer, BalancerError};

/// Round-robin selector.
///
/// The cursor is advanced before it is used, so the first pick from a
/// fresh balancer is index 1. The cursor is not renormalized when the list
/// length changes between calls.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: Mutex<usize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        *self.cursor.lock()
    }
}

impl<C> Balancer<C> for RoundRobin {
    fn next(&self, conns: &[Arc<C>]) -> Result<Arc<C>, BalancerError> {
        let mut cursor = self.cursor.lock();

        if conns.is_empty() {
            return Err(BalancerError::NoNodesAvailable);
        }

        *cursor = (*cursor + 1) % conns.len();
        Ok(conns[*cursor].clone())
    }
}
