//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the route
//! registry. All types derive Serde traits for deserialization from config
//! files, and every field has a default so minimal configs work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root configuration for the route registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Routing table settings.
    pub table: TableConfig,

    /// Registration protocol settings.
    pub registration: RegistrationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Routing table settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    /// Routes not re-registered within this window are considered stale.
    pub stale_route_timeout_secs: u64,

    /// Period of the stale-route sweep.
    pub eviction_interval_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            stale_route_timeout_secs: 300,
            eviction_interval_secs: 300,
        }
    }
}

/// Registration protocol settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Identity advertised in the router descriptor. Random per process
    /// when unset.
    pub router_id: Option<Uuid>,

    /// Host addresses advertised in the router descriptor.
    pub hosts: Vec<String>,

    /// Minimum re-registration interval advertised to peers, in seconds.
    pub register_interval_secs: u64,

    /// Heartbeat publish period in seconds. Defaults to the register
    /// interval.
    pub heartbeat_interval_secs: Option<u64>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            router_id: None,
            hosts: Vec::new(),
            register_interval_secs: 30,
            heartbeat_interval_secs: None,
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
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
