use axum::{
    extract::State,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::config::ClusterNode;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub service: String,
}

#[derive(Serialize)]
pub struct PoolStatus {
    pub pooled: Vec<String>,
    pub count: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        service: state.service.clone(),
    })
}

/// Topology as last published by the pool.
pub async fn get_nodes(State(state): State<AdminState>) -> Json<Vec<ClusterNode>> {
    Json(state.nodes.get())
}

/// Addresses that currently hold a live connection.
pub async fn get_pool(State(state): State<AdminState>) -> Json<PoolStatus> {
    let pooled = state.pool.pooled_nodes();
    Json(PoolStatus {
        count: pooled.len(),
        pooled,
    })
}
