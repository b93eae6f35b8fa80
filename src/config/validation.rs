//! Configuration validation.
//!
//! Semantic checks on top of what serde already enforces syntactically.
//! All violations are collected and returned together rather than failing
//! on the first.

use crate::config::schema::RegistryConfig;
use std::fmt;

/// A single semantic violation in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn require_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError {
            field,
            message: "must be greater than zero".to_string(),
        });
    }
}

/// Validate a configuration, returning every violation found.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    require_positive(
        &mut errors,
        "table.stale_route_timeout_secs",
        config.table.stale_route_timeout_secs,
    );
    require_positive(
        &mut errors,
        "table.eviction_interval_secs",
        config.table.eviction_interval_secs,
    );
    require_positive(
        &mut errors,
        "registration.register_interval_secs",
        config.registration.register_interval_secs,
    );
    if let Some(heartbeat) = config.registration.heartbeat_interval_secs {
        require_positive(&mut errors, "registration.heartbeat_interval_secs", heartbeat);
    }

    if config
        .registration
        .hosts
        .iter()
        .any(|host| host.trim().is_empty())
    {
        errors.push(ValidationError {
            field: "registration.hosts",
            message: "advertised hosts must not be empty strings".to_string(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
