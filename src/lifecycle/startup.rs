//! Startup wiring.
//!
//! # Responsibilities
//! - Build registry, factory, pool, resolver and balancer from configuration
//! - Hand back the manager plus the shared handles introspection needs
//!
//! # Design Decisions
//! - Construction never performs I/O; `Manager::init` does the first lookup
//! - Fail fast: any construction error is fatal

use std::sync::Arc;

use crate::config::{ClusterNodeStore, PoolServiceConfig};
use crate::db::{ConnectionPool, Manager, TcpConnectionFactory};
use crate::discovery::{ConsulRegistry, DiscoveryError, Resolver, ResolverConf};
use crate::load_balancer::RoundRobin;
use crate::observability::PoolMetrics;

/// Everything the binary needs after wiring.
pub struct Services {
    pub manager: Manager<TcpConnectionFactory>,
    pub pool: Arc<ConnectionPool<TcpConnectionFactory>>,
    pub nodes: Arc<ClusterNodeStore>,
}

/// Resolver settings derived from configuration.
pub fn resolver_conf(config: &PoolServiceConfig) -> ResolverConf {
    ResolverConf {
        service: config.discovery.service.clone(),
        tags: config.discovery.required_tags(),
        retry_interval: config.discovery.retry_interval(),
        shutdown_timeout: config.lifecycle.shutdown_timeout(),
    }
}

/// Wire the Consul-backed TCP pool described by `config`.
pub fn build_services(config: &PoolServiceConfig, metrics: PoolMetrics) -> Result<Services, DiscoveryError> {
    let registry = Arc::new(ConsulRegistry::new(&config.discovery)?);
    let nodes = Arc::new(ClusterNodeStore::new());
    let factory = TcpConnectionFactory::new(config.pool.connect_timeout());
    let pool = Arc::new(ConnectionPool::new(factory, nodes.clone(), metrics.clone()));

    let resolver = Resolver::new(registry, pool.clone(), resolver_conf(config), metrics);
    let manager = Manager::new(pool.clone(), resolver, Box::new(RoundRobin::new()));

    Ok(Services {
        manager,
        pool,
        nodes,
    })
}
