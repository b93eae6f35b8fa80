//! Shared utilities for integration testing.

// Each integration test target compiles its own copy of this module and
// uses a different subset of it.
#![allow(dead_code)]

use parking_lot::Mutex;
use route_registry::availability::RouteSource;
use route_registry::table::{Endpoint, EventSink, RouteEvent, RouteRegistrar};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Event sink that queues everything it receives for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<VecDeque<RouteEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pop the oldest recorded event, if any.
    pub fn poll(&self) -> Option<RouteEvent> {
        self.events.lock().pop_front()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: RouteEvent) {
        self.events.lock().push_back(event);
    }
}

/// A registrar call observed by [`RecordingRegistrar`].
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrarCall {
    Register {
        host: String,
        endpoint: Endpoint,
        application_id: Option<Uuid>,
        application_index: Option<u32>,
        private_instance_id: Option<String>,
    },
    Unregister {
        host: String,
        endpoint: Endpoint,
    },
}

/// Registrar fake that records every call made by the protocol driver.
#[derive(Default)]
pub struct RecordingRegistrar {
    calls: Mutex<Vec<RegistrarCall>>,
}

impl RecordingRegistrar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<RegistrarCall> {
        self.calls.lock().clone()
    }
}

impl RouteRegistrar for RecordingRegistrar {
    fn insert_route(
        &self,
        host: &str,
        endpoint: Endpoint,
        application_id: Option<Uuid>,
        application_index: Option<u32>,
        private_instance_id: Option<&str>,
    ) {
        // The driver never bulk-inserts; record as a registration anyway.
        self.register_route(
            host,
            endpoint,
            application_id,
            application_index,
            private_instance_id,
        );
    }

    fn register_route(
        &self,
        host: &str,
        endpoint: Endpoint,
        application_id: Option<Uuid>,
        application_index: Option<u32>,
        private_instance_id: Option<&str>,
    ) {
        self.calls.lock().push(RegistrarCall::Register {
            host: host.to_string(),
            endpoint,
            application_id,
            application_index,
            private_instance_id: private_instance_id.map(str::to_string),
        });
    }

    fn unregister_route(&self, host: &str, endpoint: &Endpoint) -> bool {
        self.calls.lock().push(RegistrarCall::Unregister {
            host: host.to_string(),
            endpoint: endpoint.clone(),
        });
        true
    }

    fn route_by_endpoint(&self, _endpoint: &Endpoint) -> Option<route_registry::RouteDetails> {
        None
    }
}

/// Route source whose availability can be flipped from the test body.
pub struct AvailabilityFlag(AtomicBool);

impl AvailabilityFlag {
    pub fn new(initial: bool) -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(initial)))
    }

    pub fn set(&self, available: bool) {
        self.0.store(available, Ordering::Relaxed);
    }
}

impl RouteSource for AvailabilityFlag {
    fn is_available(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// JSON payload of a route announcement with only the required fields.
pub fn announcement(host: &str, port: u16, uris: &[&str]) -> Vec<u8> {
    serde_json::json!({ "host": host, "port": port, "uris": uris })
        .to_string()
        .into_bytes()
}
