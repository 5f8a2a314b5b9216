//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PoolServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::PoolServiceConfig;

/// Longest blocking query wait Consul honours.
pub const MAX_WAIT_SECS: u64 = 600;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange { field: &'static str, value: u64, min: u64, max: u64 },

    #[error("{field} is not a valid http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &PoolServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let discovery = &config.discovery;

    if discovery.service.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "discovery.service" });
    }
    if discovery.cluster.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "discovery.cluster" });
    }
    if discovery.tags.iter().any(|t| t.trim().is_empty()) {
        errors.push(ValidationError::Empty { field: "discovery.tags[]" });
    }

    match Url::parse(&discovery.consul_address) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field: "discovery.consul_address",
            value: discovery.consul_address.clone(),
        }),
    }

    if discovery.wait_secs == 0 {
        errors.push(ValidationError::NotPositive { field: "discovery.wait_secs" });
    } else if discovery.wait_secs > MAX_WAIT_SECS {
        errors.push(ValidationError::OutOfRange {
            field: "discovery.wait_secs",
            value: discovery.wait_secs,
            min: 1,
            max: MAX_WAIT_SECS,
        });
    }
    if discovery.retry_interval_ms == 0 {
        errors.push(ValidationError::NotPositive { field: "discovery.retry_interval_ms" });
    }
    if config.pool.connect_timeout_ms == 0 {
        errors.push(ValidationError::NotPositive { field: "pool.connect_timeout_ms" });
    }
    if config.lifecycle.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive { field: "lifecycle.shutdown_timeout_secs" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
