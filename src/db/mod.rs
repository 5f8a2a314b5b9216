//! Database connection subsystem.
//!
//! # Data Flow
//! ```text
//! discovery::Resolver
//!     → conn_list.rs (ConnectionPool::set_nodes: reconcile, publish)
//!         → connection.rs (ConnectionFactory::create / Connection::close)
//!         → tcp.rs (TCP implementation)
//!
//! Caller
//!     → manager.rs (Manager::get_connection)
//!     → ConnectionPool::connections() (ordered snapshot)
//!     → load_balancer::Balancer::next()
//! ```
//!
//! # Design Decisions
//! - One connection per node address, shared by all callers via `Arc`
//! - Reconciliation never touches connections of retained nodes
//! - Creation failures are logged and retried on the next reconciliation
//! - Readers take a short read lock and never wait on connection I/O

pub mod conn_list;
pub mod connection;
pub mod manager;
pub mod tcp;

pub use conn_list::{ConnectionPool, NodeList};
pub use connection::{Connection, ConnectionError, ConnectionFactory};
pub use manager::Manager;
pub use tcp::{TcpConnection, TcpConnectionFactory};
