//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, SAAS_DC / SAAS_CLUSTER overrides)
//!     → validation.rs (semantic checks)
//!     → PoolServiceConfig (validated, immutable)
//!     → handed to subsystem constructors at startup
//!
//! Topology publication:
//!     db::ConnectionPool (after every reconciliation)
//!     → node_store.rs (atomic replace)
//!     → introspection readers (admin endpoint)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; service name and tags never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod node_store;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use node_store::{ClusterNode, ClusterNodeStore};
pub use schema::PoolServiceConfig;
pub use schema::{AdminConfig, DiscoveryConfig, LifecycleConfig, ObservabilityConfig, PoolConfig};
