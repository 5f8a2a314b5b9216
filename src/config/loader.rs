//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;
use thiserror::Error;
use crate::config::schema::PoolServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `discovery.datacenter`.
pub const DATACENTER_ENV: &str = "SAAS_DC";
/// Environment variable overriding `discovery.cluster`.
pub const CLUSTER_ENV: &str = "SAAS_CLUSTER";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
///
/// Without a path the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<PoolServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => PoolServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply datacenter/cluster overrides. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut PoolServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dc) = lookup(DATACENTER_ENV).filter(|v| !v.is_empty()) {
        config.discovery.datacenter = dc;
    }
    if let Some(cluster) = lookup(CLUSTER_ENV).filter(|v| !v.is_empty()) {
        config.discovery.cluster = cluster;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(DATACENTER_ENV, "eu1"), (CLUSTER_ENV, "")].into();
        let mut config = PoolServiceConfig::default();

        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.discovery.datacenter, "eu1");
        // empty value keeps the file/default value
        assert_eq!(config.discovery.cluster, "dev");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cluster-pool-{}.toml", std::process::id()));
        fs::write(&path, "[discovery]\nservice = \"database\"\nwait_secs = 30\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.discovery.service, "database");
        assert_eq!(config.discovery.wait_secs, 30);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("cluster-pool-bad-{}.toml", std::process::id()));
        fs::write(&path, "[pool]\nconnect_timeout_ms = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        let _ = fs::remove_file(&path);

        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("pool.connect_timeout_ms"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_error_lists_every_field() {
        let err = ConfigError::Validation(vec![
            ValidationError::Empty { field: "discovery.service" },
            ValidationError::NotPositive { field: "discovery.wait_secs" },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: discovery.service must not be empty, discovery.wait_secs must be greater than zero"
        );
    }
}
