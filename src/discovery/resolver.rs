//! Topology resolver.
//!
//! # Responsibilities
//! - Perform the initial, startup-blocking registry lookup
//! - Run the background watch loop that keeps the pool in sync
//! - Stop the loop and wait for it on shutdown
//!
//! # States
//! ```text
//! Idle → Watching → Stopped
//! Idle → Stopped (shutdown before a successful init)
//! ```

use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::NodeList;
use crate::discovery::registry::{DiscoveryError, Registry, WaitIndex};
use crate::observability::PoolMetrics;

/// What the resolver looks up.
#[derive(Debug, Clone)]
pub struct ResolverConf {
    /// Service name.
    pub service: String,
    /// Tags every node must carry.
    pub tags: Vec<String>,
    /// Delay before retrying a failed lookup in the watch loop.
    pub retry_interval: Duration,
    /// Upper bound for waiting on the watch loop during shutdown.
    pub shutdown_timeout: Duration,
}

impl ResolverConf {
    pub fn new(service: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            service: service.into(),
            tags,
            retry_interval: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Errors reported by the resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The initial lookup failed; the service must not start.
    #[error("initial node lookup failed: {0}")]
    Lookup(#[from] DiscoveryError),

    #[error("resolver already started")]
    AlreadyStarted,

    #[error("resolver has been shut down")]
    Stopped,

    /// The watch loop did not exit within the shutdown bound.
    #[error("resolver watch loop did not stop within {timeout:?}")]
    ShutdownIncomplete { timeout: Duration },

    #[error("resolver watch loop panicked")]
    WatchPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    Watching,
    Stopped,
}

struct Inner {
    state: ResolverState,
    task: Option<JoinHandle<()>>,
}

/// Keeps a node list in sync with the registry.
pub struct Resolver {
    registry: Arc<dyn Registry>,
    nodes: Arc<dyn NodeList>,
    conf: ResolverConf,
    metrics: PoolMetrics,
    cancel: CancellationToken,
    inner: Mutex<Inner>,
    /// Held by `init` from the first lookup until the loop is spawned.
    starting: tokio::sync::Mutex<()>,
}

impl Resolver {
    pub fn new(
        registry: Arc<dyn Registry>,
        nodes: Arc<dyn NodeList>,
        conf: ResolverConf,
        metrics: PoolMetrics,
    ) -> Self {
        Self {
            registry,
            nodes,
            conf,
            metrics,
            cancel: CancellationToken::new(),
            inner: Mutex::new(Inner {
                state: ResolverState::Idle,
                task: None,
            }),
            starting: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> ResolverState {
        self.inner.lock().state
    }

    /// Resolve the topology once and start watching it.
    ///
    /// On failure the watch loop is not started and the resolver stays idle.
    /// A concurrent `shutdown` waits for this to finish, and a lookup that
    /// completes after cancellation is discarded.
    pub async fn init(&self) -> Result<(), ResolverError> {
        let _starting = self.starting.lock().await;
        ensure_idle(self.state())?;

        let result = self
            .registry
            .lookup(&self.cancel, &self.conf.service, &self.conf.tags, WaitIndex::default())
            .await;
        if self.cancel.is_cancelled() {
            tracing::debug!(service = %self.conf.service, "Initial lookup discarded, resolver is shutting down");
            return Err(ResolverError::Stopped);
        }
        let snapshot = result.inspect_err(|_| self.metrics.record_lookup(false))?;
        self.metrics.record_lookup(true);

        tracing::info!(
            service = %self.conf.service,
            nodes = snapshot.nodes.len(),
            wait_index = %snapshot.index,
            "Initial topology resolved"
        );
        self.nodes.set_nodes(snapshot.nodes).await;

        let watch = Watch {
            registry: self.registry.clone(),
            nodes: self.nodes.clone(),
            conf: self.conf.clone(),
            metrics: self.metrics.clone(),
            cancel: self.cancel.clone(),
        };

        let mut inner = self.inner.lock();
        ensure_idle(inner.state)?;
        inner.task = Some(tokio::spawn(watch.run(snapshot.index)));
        inner.state = ResolverState::Watching;

        Ok(())
    }

    /// Stop the watch loop and wait for it to exit.
    ///
    /// After this returns no further `set_nodes` calls are made by the
    /// resolver, including from an `init` that was still in flight. Waiting
    /// is bounded by `shutdown_timeout` overall.
    pub async fn shutdown(&self) -> Result<(), ResolverError> {
        self.cancel.cancel();
        self.inner.lock().state = ResolverState::Stopped;

        let deadline = tokio::time::Instant::now() + self.conf.shutdown_timeout;
        let Ok(_starting) = tokio::time::timeout_at(deadline, self.starting.lock()).await else {
            tracing::error!(
                service = %self.conf.service,
                timeout = ?self.conf.shutdown_timeout,
                "Resolver init did not finish in time"
            );
            return Err(ResolverError::ShutdownIncomplete {
                timeout: self.conf.shutdown_timeout,
            });
        };

        let task = self.inner.lock().task.take();
        let Some(mut task) = task else {
            return Ok(());
        };

        match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(Ok(())) => {
                tracing::debug!(service = %self.conf.service, "Resolver stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(service = %self.conf.service, error = %e, "Resolver watch loop failed");
                Err(ResolverError::WatchPanicked)
            }
            Err(_) => {
                tracing::error!(
                    service = %self.conf.service,
                    timeout = ?self.conf.shutdown_timeout,
                    "Resolver watch loop did not stop in time, aborting it"
                );
                task.abort();
                if let Err(e) = task.await {
                    tracing::debug!(service = %self.conf.service, error = %e, "Aborted watch loop joined");
                }
                Err(ResolverError::ShutdownIncomplete {
                    timeout: self.conf.shutdown_timeout,
                })
            }
        }
    }
}

fn ensure_idle(state: ResolverState) -> Result<(), ResolverError> {
    match state {
        ResolverState::Idle => Ok(()),
        ResolverState::Watching => Err(ResolverError::AlreadyStarted),
        ResolverState::Stopped => Err(ResolverError::Stopped),
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// State owned by the background task. The wait index never leaves it.
struct Watch {
    registry: Arc<dyn Registry>,
    nodes: Arc<dyn NodeList>,
    conf: ResolverConf,
    metrics: PoolMetrics,
    cancel: CancellationToken,
}

impl Watch {
    async fn run(self, mut wait_index: WaitIndex) {
        tracing::debug!(service = %self.conf.service, wait_index = %wait_index, "Resolver watch loop started");

        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.registry.lookup(&self.cancel, &self.conf.service, &self.conf.tags, wait_index) => result,
            };

            match result {
                Ok(snapshot) => {
                    self.metrics.record_lookup(true);
                    if snapshot.index != wait_index {
                        tracing::debug!(
                            service = %self.conf.service,
                            wait_index = %snapshot.index,
                            nodes = snapshot.nodes.len(),
                            "Topology update received"
                        );
                    }
                    wait_index = snapshot.index;
                    self.nodes.set_nodes(snapshot.nodes).await;
                }
                Err(_) if self.cancel.is_cancelled() => break,
                Err(e) => {
                    self.metrics.record_lookup(false);
                    tracing::error!(
                        service = %self.conf.service,
                        tags = ?self.conf.tags,
                        error = %e,
                        retry_in = ?self.conf.retry_interval,
                        "Failed to lookup nodes"
                    );

                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.conf.retry_interval) => {}
                    }
                }
            }
        }

        tracing::debug!(service = %self.conf.service, "Resolver watch loop exited");
    }
}
