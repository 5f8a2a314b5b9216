//! Discovery-driven database connection pool.
//!
//! Keeps one connection per database node reported by the service
//! registry, follows topology changes in the background and hands out
//! connections round robin.

pub mod admin;
pub mod config;
pub mod db;
pub mod discovery;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use config::PoolServiceConfig;
pub use db::{ConnectionPool, Manager};
pub use discovery::Resolver;
pub use lifecycle::Shutdown;
