//! cluster-pool service.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────┐  blocking query   ┌──────────┐  set_nodes   ┌────────────────┐
//!   │  Consul  │◀─────────────────│ Resolver │─────────────▶│ ConnectionPool │──▶ ClusterNodeStore
//!   └──────────┘                   └──────────┘              └───────┬────────┘        │
//!                                                                    │ connections()   ▼
//!                                  ┌──────────┐   next()     ┌───────▼────────┐   admin endpoint
//!   data-access layer ────────────▶│ Manager  │─────────────▶│   RoundRobin   │
//!                                  └──────────┘              └────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use cluster_pool::admin::{self, AdminState};
use cluster_pool::config::load_config;
use cluster_pool::lifecycle::{build_services, signals, Shutdown};
use cluster_pool::observability::{logging, metrics, PoolMetrics};

#[derive(Parser)]
#[command(name = "cluster-pool")]
#[command(about = "Keeps a database connection pool in sync with Consul", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.observability.log_level);
    logging::init_logging(level);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: cluster_pool::PoolServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        service = %config.discovery.service,
        datacenter = %config.discovery.datacenter,
        cluster = %config.discovery.cluster,
        consul = %config.discovery.consul_address,
        "cluster-pool v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let pool_metrics = if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
        PoolMetrics::new(&config.discovery.service)
    } else {
        PoolMetrics::noop()
    };

    let services = build_services(&config, pool_metrics)?;

    tracing::info!("Initialize connection manager");
    if let Err(e) = services.manager.init().await {
        tracing::error!(error = %e, "Failed to initialize connection manager");
        return Err(e.into());
    }
    tracing::info!(
        nodes = services.nodes.get().len(),
        pooled = services.pool.connections().len(),
        "Connection manager initialized"
    );

    let shutdown = Shutdown::new();
    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            service: config.discovery.service.clone(),
            nodes: services.nodes.clone(),
            pool: services.pool.clone(),
        };
        let stop = shutdown.signalled();
        Some(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, stop).await {
                tracing::error!(error = %e, "Admin endpoint failed");
            }
        }))
    } else {
        None
    };

    signals::wait_for_shutdown_signal().await;
    tracing::info!("Shutting down");

    shutdown.trigger();
    if let Some(task) = admin_task {
        admin::join(task).await;
    }

    let result = services.manager.shutdown().await;
    match &result {
        Ok(()) => tracing::info!("Shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Shutdown incomplete"),
    }
    result.map_err(Into::into)
}
