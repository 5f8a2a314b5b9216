//! Consul-backed service discovery registry.
//!
//! # Responsibilities
//! - Query the Consul health API for passing instances of a service
//! - Use blocking queries (`index` + `wait`) so lookups return on change
//! - Filter instances by required tags and build `host:port` addresses

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::discovery::registry::{DiscoveryError, Registry, TopologySnapshot, WaitIndex};

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";

/// Extra time allowed on top of the blocking wait before the HTTP request
/// itself times out. Consul adds up to wait/16 of jitter.
const REQUEST_SLACK: Duration = Duration::from_secs(30);

/// One entry of `/v1/health/service/<service>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceEntry {
    pub node: EntryNode,
    pub service: EntryService,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryNode {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryService {
    #[serde(default)]
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Registry implementation over the Consul HTTP API.
#[derive(Debug, Clone)]
pub struct ConsulRegistry {
    client: reqwest::Client,
    base_url: Url,
    datacenter: String,
    cluster: String,
    wait: Duration,
    token: Option<String>,
}

impl ConsulRegistry {
    /// Create a registry client from discovery configuration.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let base_url: Url = config.consul_address.parse().map_err(|e| {
            DiscoveryError::Unavailable(format!(
                "invalid Consul address '{}': {}",
                config.consul_address, e
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.wait() + REQUEST_SLACK)
            .build()?;

        Ok(Self {
            client,
            base_url,
            datacenter: config.datacenter.clone(),
            cluster: config.cluster.clone(),
            wait: config.wait(),
            token: config.token.clone(),
        })
    }

    fn service_url(&self, service: &str) -> Result<Url, DiscoveryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Unavailable(format!("Consul address '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["v1", "health", "service", service]);
        Ok(url)
    }

    async fn fetch(
        &self,
        service: &str,
        tags: &[String],
        wait_index: WaitIndex,
    ) -> Result<TopologySnapshot, DiscoveryError> {
        let url = self.service_url(service)?;
        let query = [
            ("passing", "true".to_string()),
            ("tag", self.cluster.clone()),
            ("dc", self.datacenter.clone()),
            ("index", wait_index.to_string()),
            ("wait", format!("{}s", self.wait.as_secs())),
        ];

        let mut request = self.client.get(url).query(&query);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let index = parse_index(
            response
                .headers()
                .get(INDEX_HEADER)
                .map(|v| v.to_str().unwrap_or_default()),
        )?;

        let mut entries: Vec<ServiceEntry> = response.json().await?;
        if !tags.is_empty() {
            entries = filter_entries(entries, tags);
        }

        Ok(TopologySnapshot {
            nodes: parse_entries(&entries),
            index,
        })
    }
}

#[async_trait]
impl Registry for ConsulRegistry {
    async fn lookup(
        &self,
        cancel: &CancellationToken,
        service: &str,
        tags: &[String],
        wait_index: WaitIndex,
    ) -> Result<TopologySnapshot, DiscoveryError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
            result = self.fetch(service, tags, wait_index) => result,
        }
    }
}

fn parse_index(header: Option<&str>) -> Result<WaitIndex, DiscoveryError> {
    let raw = header.ok_or(DiscoveryError::MissingIndex)?;
    raw.trim()
        .parse::<u64>()
        .map(WaitIndex)
        .map_err(|_| DiscoveryError::InvalidIndex(raw.to_string()))
}

/// Keep only entries carrying every required tag.
pub fn filter_entries(entries: Vec<ServiceEntry>, tags: &[String]) -> Vec<ServiceEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let have = entry.service.tags.as_deref().unwrap_or_default();
            tags.iter().all(|required| have.contains(required))
        })
        .collect()
}

/// Build `host:port` addresses, preferring the service address unless it
/// is empty or loopback.
pub fn parse_entries(entries: &[ServiceEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let service_addr = entry.service.address.as_str();
            let host = match service_addr {
                "" | "127.0.0.1" | "localhost" => entry.node.address.as_str(),
                addr => addr,
            };
            format!("{}:{}", host, entry.service.port)
        })
        .collect()
}
