//! Route value types.
//!
//! # Responsibilities
//! - Represent a backend endpoint (host + port, unresolved names allowed)
//! - Represent a point-in-time route snapshot
//! - Define the registration-equality rule used for change detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use uuid::Uuid;

/// A backend network endpoint.
///
/// The host may be an IP address or an unresolved name; this crate never
/// performs DNS resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Error returned when parsing an endpoint from a `host:port` string.
#[derive(Debug, thiserror::Error)]
#[error("invalid endpoint {0:?}, expected host:port")]
pub struct ParseEndpointError(String);

impl FromStr for Endpoint {
    type Err = ParseEndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ParseEndpointError(s.to_string()))?;
        if host.is_empty() {
            return Err(ParseEndpointError(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ParseEndpointError(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

/// A snapshot of a registered route.
///
/// The `host` is always lowercase. `last_updated` is a monotonic timestamp
/// refreshed on every registration of the same (host, endpoint) pair.
#[derive(Debug, Clone)]
pub struct RouteDetails {
    pub endpoint: Endpoint,
    pub application_id: Option<Uuid>,
    pub application_index: Option<u32>,
    pub host: String,
    pub private_instance_id: Option<String>,
    pub last_updated: Instant,
}

impl RouteDetails {
    /// Whether `other` describes the same registration.
    ///
    /// Compares endpoint, application id, and private instance id.
    /// `application_index` is deliberately excluded: an index-only change
    /// refreshes the route's timestamp but is not treated as a new
    /// registration and emits no event. This mirrors the behavior of the
    /// router fleets this registry interoperates with.
    pub fn same_registration(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
            && self.application_id == other.application_id
            && self.private_instance_id == other.private_instance_id
    }
}
