//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the cluster pool service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PoolServiceConfig {
    /// Service discovery settings (Consul, target service, tags).
    pub discovery: DiscoveryConfig,

    /// Connection pool settings.
    pub pool: PoolConfig,

    /// Startup/shutdown settings.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin introspection endpoint.
    pub admin: AdminConfig,
}

/// Service discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Consul HTTP API base address.
    pub consul_address: String,

    /// Consul datacenter to query.
    pub datacenter: String,

    /// Cluster name, used as the Consul tag for the service query.
    pub cluster: String,

    /// Name of the database service registered in Consul.
    pub service: String,

    /// Tags every node must carry. Empty means `[cluster]`.
    pub tags: Vec<String>,

    /// Maximum time a blocking query waits for a change, in seconds.
    pub wait_secs: u64,

    /// Delay before retrying a failed lookup, in milliseconds.
    pub retry_interval_ms: u64,

    /// Optional Consul ACL token.
    pub token: Option<String>,
}

impl DiscoveryConfig {
    /// Tags the resolver asks the registry to filter on.
    pub fn required_tags(&self) -> Vec<String> {
        if self.tags.is_empty() {
            vec![self.cluster.clone()]
        } else {
            self.tags.clone()
        }
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            consul_address: "http://127.0.0.1:8500".to_string(),
            datacenter: "dc1".to_string(),
            cluster: "dev".to_string(),
            service: "mysql".to_string(),
            tags: Vec::new(),
            wait_secs: 300,
            retry_interval_ms: 1000,
            token: None,
        }
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl PoolConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5000,
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long shutdown waits for the resolver loop to exit, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl LifecycleConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin introspection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin endpoint.
    pub enabled: bool,

    /// Admin endpoint bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: PoolServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.discovery.service, "mysql");
        assert_eq!(config.discovery.retry_interval(), Duration::from_secs(1));
        assert_eq!(config.lifecycle.shutdown_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_required_tags_default_to_cluster() {
        let mut discovery = DiscoveryConfig::default();
        discovery.cluster = "eu-west".into();
        assert_eq!(discovery.required_tags(), vec!["eu-west".to_string()]);

        discovery.tags = vec!["primary".into(), "v8".into()];
        assert_eq!(discovery.required_tags(), vec!["primary".to_string(), "v8".to_string()]);
    }

    #[test]
    fn test_partial_section() {
        let config: PoolServiceConfig = toml::from_str(
            r#"
            [discovery]
            service = "database"
            tags = ["replica"]

            [pool]
            connect_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.service, "database");
        assert_eq!(config.discovery.datacenter, "dc1");
        assert_eq!(config.pool.connect_timeout(), Duration::from_millis(250));
    }
}
