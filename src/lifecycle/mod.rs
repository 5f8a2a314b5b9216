//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build services → Manager::init (fatal on error) → Admin listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop admin listener → Manager::shutdown → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the pool, then listeners
//! - Ordered shutdown: resolver stops before the pool is closed
//! - Shutdown has a bound: a stuck resolver is reported, not waited on forever

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_services, Services};
