//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Detect duplicate route URIs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LookupConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::LookupConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("route #{index} has an empty uri")]
    EmptyUri { index: usize },

    #[error("route {uri:?} is defined more than once")]
    DuplicateUri { uri: String },

    #[error("route {uri:?} has an endpoint with an empty app_id")]
    EmptyAppId { uri: String },

    #[error("route {uri:?} has an invalid endpoint address {address:?}")]
    InvalidEndpoint { uri: String, address: String },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &LookupConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        let normalized = route.uri.trim_end_matches('/').to_lowercase();
        if normalized.is_empty() {
            errors.push(ValidationError::EmptyUri { index });
            continue;
        }
        if !seen.insert(normalized) {
            errors.push(ValidationError::DuplicateUri { uri: route.uri.clone() });
        }

        for endpoint in &route.endpoints {
            if endpoint.app_id.is_empty() {
                errors.push(ValidationError::EmptyAppId { uri: route.uri.clone() });
            }
            if endpoint.address.parse::<SocketAddr>().is_err() {
                errors.push(ValidationError::InvalidEndpoint {
                    uri: route.uri.clone(),
                    address: endpoint.address.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
