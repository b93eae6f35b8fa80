//! Wire messages of the registration protocol.
//!
//! Field names follow the Cloud Foundry router registration protocol so
//! this registry can share a control plane with existing emitters.

use crate::table::route::Endpoint;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subjects the registration protocol uses.
pub mod subjects {
    /// Inbound route announcements.
    pub const REGISTER: &str = "router.register";
    /// Inbound route withdrawals.
    pub const UNREGISTER: &str = "router.unregister";
    /// Discovery probes from peers; replied to with a [`super::RouterDescriptor`].
    pub const GREET: &str = "router.greet";
    /// Descriptor broadcasts, published at start and on bus reconnect.
    pub const START: &str = "router.start";
    /// Heartbeat requests, looped back by the bus to prove connectivity.
    pub const PING: &str = "registry.ping";
}

/// A route announcement or withdrawal.
///
/// One announcement maps a single backend endpoint to any number of
/// virtual host URIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAnnouncement {
    pub host: String,
    pub port: u16,
    pub uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_instance_id: Option<String>,
}

impl RouteAnnouncement {
    /// The backend endpoint this announcement targets.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

/// Self-descriptor published on start, on reconnect, and in reply to
/// greet probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterDescriptor {
    pub id: Uuid,
    pub hosts: Vec<String>,
    #[serde(rename = "minimumRegisterIntervalInSeconds")]
    pub minimum_register_interval_in_seconds: u64,
}

/// Body used for greet and heartbeat messages, which carry no fields.
pub const EMPTY_BODY: &[u8] = b"{}";
