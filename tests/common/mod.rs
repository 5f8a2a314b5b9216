//! Shared fakes for integration tests.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use cluster_pool::config::ClusterNodeStore;
use cluster_pool::db::{Connection, ConnectionError, ConnectionFactory, ConnectionPool, Manager};
use cluster_pool::discovery::{DiscoveryError, Registry, Resolver, ResolverConf, TopologySnapshot, WaitIndex};
use cluster_pool::load_balancer::RoundRobin;
use cluster_pool::observability::PoolMetrics;

/// Records what the factory and its connections did.
#[derive(Default)]
pub struct FactoryLog {
    created: Mutex<Vec<String>>,
    closed: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    serial: AtomicUsize,
}

/// Connection factory that never touches the network.
#[derive(Clone, Default)]
pub struct MockFactory {
    log: Arc<FactoryLog>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make creation fail for `node` until `heal` is called.
    pub fn fail(&self, node: &str) {
        self.log.failing.lock().unwrap().insert(node.to_string());
    }

    pub fn heal(&self, node: &str) {
        self.log.failing.lock().unwrap().remove(node);
    }

    /// Make creation for `node` block forever.
    pub fn hang(&self, node: &str) {
        self.log.hanging.lock().unwrap().insert(node.to_string());
    }

    /// Make every creation take `delay`.
    pub fn slow(&self, delay: Duration) {
        *self.log.delay.lock().unwrap() = Some(delay);
    }

    pub fn created(&self) -> Vec<String> {
        self.log.created.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.log.closed.lock().unwrap().clone()
    }
}

pub struct MockConnection {
    pub node: String,
    pub serial: usize,
    closed: AtomicBool,
    log: Arc<FactoryLog>,
}

impl MockConnection {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn close(&self) -> Result<(), ConnectionError> {
        self.closed.store(true, Ordering::SeqCst);
        self.log.closed.lock().unwrap().push(self.node.clone());
        Ok(())
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    type Conn = MockConnection;

    async fn create(&self, node: &str) -> Result<MockConnection, ConnectionError> {
        let hang = self.log.hanging.lock().unwrap().contains(node);
        if hang {
            std::future::pending::<()>().await;
        }
        let delay = *self.log.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let fail = self.log.failing.lock().unwrap().contains(node);
        if fail {
            return Err(ConnectionError::Connect {
                node: node.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            });
        }

        self.log.created.lock().unwrap().push(node.to_string());
        Ok(MockConnection {
            node: node.to_string(),
            serial: self.log.serial.fetch_add(1, Ordering::SeqCst),
            closed: AtomicBool::new(false),
            log: self.log.clone(),
        })
    }
}

pub type ScriptedResult = Result<(Vec<&'static str>, u64), &'static str>;

/// Registry answering from a queue; blocks like a long poll when empty.
#[derive(Default)]
pub struct ScriptedRegistry {
    queue: Mutex<VecDeque<ScriptedResult>>,
    indexes: Mutex<Vec<WaitIndex>>,
    ready: Notify,
    cancelled: AtomicBool,
}

impl ScriptedRegistry {
    pub fn new(script: Vec<ScriptedResult>) -> Arc<Self> {
        let registry = Self::default();
        registry.queue.lock().unwrap().extend(script);
        Arc::new(registry)
    }

    pub fn push(&self, result: ScriptedResult) {
        self.queue.lock().unwrap().push_back(result);
        self.ready.notify_one();
    }

    /// Wait indexes received, in call order.
    pub fn indexes(&self) -> Vec<WaitIndex> {
        self.indexes.lock().unwrap().clone()
    }

    /// Whether a pending lookup was abandoned, either on the token or by
    /// being dropped before it produced a result.
    pub fn saw_cancellation(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for ScriptedRegistry {
    async fn lookup(
        &self,
        cancel: &CancellationToken,
        _service: &str,
        _tags: &[String],
        wait_index: WaitIndex,
    ) -> Result<TopologySnapshot, DiscoveryError> {
        self.indexes.lock().unwrap().push(wait_index);
        let mut pending = Pending {
            abandoned: &self.cancelled,
            answered: false,
        };

        loop {
            let next = self.queue.lock().unwrap().pop_front();
            match next {
                Some(Ok((nodes, index))) => {
                    pending.answered = true;
                    return Ok(TopologySnapshot {
                        nodes: nodes.into_iter().map(String::from).collect(),
                        index: WaitIndex(index),
                    });
                }
                Some(Err(msg)) => {
                    pending.answered = true;
                    return Err(DiscoveryError::Unavailable(msg.to_string()));
                }
                None => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
                _ = self.ready.notified() => {}
            }
        }
    }
}

/// Flags the lookup as abandoned unless it was answered from the script.
struct Pending<'a> {
    abandoned: &'a AtomicBool,
    answered: bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.answered {
            self.abandoned.store(true, Ordering::SeqCst);
        }
    }
}

/// Registry that answers once after `delay`, ignoring cancellation.
pub struct SlowRegistry {
    pub delay: Duration,
    pub nodes: Vec<&'static str>,
}

#[async_trait]
impl Registry for SlowRegistry {
    async fn lookup(
        &self,
        _cancel: &CancellationToken,
        _service: &str,
        _tags: &[String],
        _wait_index: WaitIndex,
    ) -> Result<TopologySnapshot, DiscoveryError> {
        tokio::time::sleep(self.delay).await;
        Ok(TopologySnapshot {
            nodes: self.nodes.iter().map(|n| n.to_string()).collect(),
            index: WaitIndex(1),
        })
    }
}

pub fn test_conf() -> ResolverConf {
    ResolverConf {
        service: "mysql".into(),
        tags: vec!["dev".into()],
        retry_interval: Duration::from_millis(20),
        shutdown_timeout: Duration::from_secs(2),
    }
}

pub fn new_pool<F: ConnectionFactory>(factory: F) -> (Arc<ConnectionPool<F>>, Arc<ClusterNodeStore>) {
    let store = Arc::new(ClusterNodeStore::new());
    let pool = Arc::new(ConnectionPool::new(factory, store.clone(), PoolMetrics::noop()));
    (pool, store)
}

/// Wire a manager the same way the binary does, with the given fakes.
pub fn build_manager<F: ConnectionFactory>(
    registry: Arc<dyn Registry>,
    factory: F,
    conf: ResolverConf,
) -> (Manager<F>, Arc<ClusterNodeStore>) {
    let (pool, store) = new_pool(factory);
    let resolver = Resolver::new(registry, pool.clone(), conf, PoolMetrics::noop());
    (Manager::new(pool, resolver, Box::new(RoundRobin::new())), store)
}

/// Node names of a connection snapshot, in order.
pub fn names(conns: &[Arc<MockConnection>]) -> Vec<String> {
    conns.iter().map(|c| c.node.clone()).collect()
}

/// Poll `cond` until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Start a TCP listener standing in for a database node.
///
/// Accepted sockets are kept open until the listener task ends.
pub async fn start_mock_node() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            match listener.accept().await {
                Ok((socket, _)) => held.push(socket),
                Err(_) => break,
            }
        }
    });

    addr
}

/// Run `fut` with a deadline, panicking with `what` on timeout.
pub async fn within<T>(what: &str, fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .unwrap_or_else(|_| panic!("timed out: {}", what))
}
