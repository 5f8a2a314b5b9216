//! Database connection manager.

use std::sync::Arc;

use crate::db::conn_list::ConnectionPool;
use crate::db::connection::ConnectionFactory;
use crate::discovery::{Resolver, ResolverError};
use crate::load_balancer::{Balancer, BalancerError};

/// Facade used by the data-access layer.
///
/// Composes the resolver (topology), the pool (connections) and the
/// balancer (selection).
pub struct Manager<F: ConnectionFactory> {
    pool: Arc<ConnectionPool<F>>,
    resolver: Resolver,
    balancer: Box<dyn Balancer<F::Conn>>,
}

impl<F: ConnectionFactory> Manager<F> {
    pub fn new(
        pool: Arc<ConnectionPool<F>>,
        resolver: Resolver,
        balancer: Box<dyn Balancer<F::Conn>>,
    ) -> Self {
        Self {
            pool,
            resolver,
            balancer,
        }
    }

    /// Resolve the initial topology and start watching it.
    pub async fn init(&self) -> Result<(), ResolverError> {
        self.resolver.init().await
    }

    /// Stop topology updates, then close every pooled connection.
    ///
    /// The pool is closed even when the resolver failed to stop in time;
    /// that failure is still returned.
    pub async fn shutdown(&self) -> Result<(), ResolverError> {
        let stopped = self.resolver.shutdown().await;
        self.pool.close().await;
        stopped
    }

    /// Connection to use for the next unit of work.
    pub fn get_connection(&self) -> Result<Arc<F::Conn>, BalancerError> {
        self.balancer.next(&self.pool.connections())
    }

    pub fn pool(&self) -> &Arc<ConnectionPool<F>> {
        &self.pool
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}
