//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver / ConnectionPool produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (PoolMetrics handles: gauges, counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Metric handles are injected, not looked up from global state at call sites

pub mod logging;
pub mod metrics;

pub use metrics::PoolMetrics;
