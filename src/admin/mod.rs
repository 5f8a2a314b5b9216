//! Read-only introspection endpoint.
//!
//! # Routes
//! - `GET /admin/status`: version and service name
//! - `GET /admin/nodes`: published topology (`host`, `port`)
//! - `GET /admin/pool`: addresses holding a live connection

pub mod handlers;

use axum::{
    routing::get,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ClusterNodeStore;
use crate::db::NodeList;
use self::handlers::*;

#[derive(Clone)]
pub struct AdminState {
    pub service: String,
    pub nodes: Arc<ClusterNodeStore>,
    pub pool: Arc<dyn NodeList>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/nodes", get(get_nodes))
        .route("/admin/pool", get(get_pool))
        .with_state(state)
}

/// Serve the admin router until `shutdown` resolves.
pub async fn serve<S>(listener: TcpListener, state: AdminState, shutdown: S) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin endpoint listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Admin endpoint stopped");
    Ok(())
}

/// Wait for a spawned admin server task. Returns false if it panicked.
pub async fn join(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Admin endpoint task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::extract::State;
    use crate::config::ClusterNode;
    use crate::lifecycle::Shutdown;

    struct StaticPool(Vec<String>);

    #[async_trait]
    impl NodeList for StaticPool {
        async fn set_nodes(&self, _nodes: Vec<String>) {}

        fn pooled_nodes(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    fn state() -> AdminState {
        let nodes = Arc::new(ClusterNodeStore::new());
        nodes.set(vec![ClusterNode::new("10.0.0.1", 3306), ClusterNode::new("10.0.0.2", 3306)]);
        AdminState {
            service: "mysql".into(),
            nodes,
            pool: Arc::new(StaticPool(vec!["10.0.0.1:3306".into()])),
        }
    }

    #[tokio::test]
    async fn test_nodes_handler() {
        let nodes = get_nodes(State(state())).await.0;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], ClusterNode::new("10.0.0.2", 3306));
    }

    #[tokio::test]
    async fn test_pool_handler() {
        let status = get_pool(State(state())).await.0;
        assert_eq!(status.count, 1);
        assert_eq!(status.pooled, vec!["10.0.0.1:3306".to_string()]);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = Shutdown::new();
        let server = tokio::spawn(serve(listener, state(), shutdown.signalled()));

        shutdown.trigger();
        let result = tokio::time::timeout(std::time::Duration::from_secs(2), server)
            .await
            .expect("admin server did not stop");
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_join_reports_failed_task() {
        let task = tokio::spawn(async { panic!("admin task blew up") });
        assert!(!join(task).await);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = Shutdown::new();
        let stop = shutdown.signalled();
        let task = tokio::spawn(async move {
            let _ = serve(listener, state(), stop).await;
        });
        shutdown.trigger();
        assert!(join(task).await);
    }
}
