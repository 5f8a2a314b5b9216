//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver::init()
//!     → registry.rs (Registry::lookup with index 0)
//!     → db::NodeList::set_nodes(nodes)
//!     → spawn watch loop
//!
//! Watch loop (until cancelled):
//!     → Registry::lookup(last index)   (blocks until change or wait elapses)
//!     → Ok: remember index, set_nodes(nodes)
//!     → Err: log, sleep retry interval, try again
//! ```
//!
//! # Design Decisions
//! - consul.rs is the production registry; anything implementing `Registry` works
//! - Initial lookup failure is fatal, watch loop failures never are
//! - The wait index is owned by the watch task; it is never reset or rewound
//! - Shutdown cancels the in-flight lookup and joins the task with a bound

pub mod consul;
pub mod registry;
pub mod resolver;

pub use consul::ConsulRegistry;
pub use registry::{DiscoveryError, Registry, TopologySnapshot, WaitIndex};
pub use resolver::{Resolver, ResolverConf, ResolverError, ResolverState};
