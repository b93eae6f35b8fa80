//! Registration protocol driver.
//!
//! # Responsibilities
//! - Turn inbound register/unregister announcements into table calls
//! - Answer greet probes and broadcast the router descriptor
//! - Publish heartbeats and track replies to compute self-health
//!
//! # States
//! ```text
//! Created → Started → Closed
//! ```
//! No transition back from Closed. `close` is safe before start and safe
//! to repeat.

use crate::availability::RouteSource;
use crate::bus::messages::{subjects, RouteAnnouncement, RouterDescriptor, EMPTY_BODY};
use crate::bus::{MessageBus, SubscriptionId};
use crate::table::RouteRegistrar;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use uuid::Uuid;

const DEFAULT_REGISTER_INTERVAL: Duration = Duration::from_secs(30);

/// Builder for [`RegistrationDriver`]. The bus and registrar are required
/// and therefore constructor arguments; everything else has a default.
pub struct RegistrationDriverBuilder {
    bus: Arc<dyn MessageBus>,
    registrar: Arc<dyn RouteRegistrar>,
    router_id: Uuid,
    hosts: Vec<String>,
    register_interval: Duration,
    heartbeat_interval: Option<Duration>,
}

impl RegistrationDriverBuilder {
    pub fn router_id(mut self, id: Uuid) -> Self {
        self.router_id = id;
        self
    }

    /// Advertise a host address in the descriptor.
    pub fn add_host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Minimum re-registration interval advertised to peers.
    pub fn register_interval(mut self, interval: Duration) -> Self {
        self.register_interval = interval;
        self
    }

    /// Heartbeat publish period. Defaults to the register interval.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    pub fn build(self) -> RegistrationDriver {
        let descriptor = RouterDescriptor {
            id: self.router_id,
            hosts: self.hosts,
            minimum_register_interval_in_seconds: self.register_interval.as_secs(),
        };
        let descriptor_payload =
            serde_json::to_vec(&descriptor).expect("descriptor is always serializable");
        RegistrationDriver {
            bus: self.bus,
            registrar: self.registrar,
            descriptor,
            descriptor_payload,
            heartbeat_interval: self.heartbeat_interval.unwrap_or(self.register_interval),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            last_heartbeat: Arc::new(Mutex::new(None)),
            subscriptions: Mutex::new(Vec::new()),
            heartbeat_task: Mutex::new(None),
        }
    }
}

/// Stateful adapter between the message bus and the routing table.
pub struct RegistrationDriver {
    bus: Arc<dyn MessageBus>,
    registrar: Arc<dyn RouteRegistrar>,
    descriptor: RouterDescriptor,
    descriptor_payload: Vec<u8>,
    heartbeat_interval: Duration,
    started: AtomicBool,
    closed: AtomicBool,
    last_heartbeat: Arc<Mutex<Option<Instant>>>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
}

impl RegistrationDriver {
    pub fn builder(
        bus: Arc<dyn MessageBus>,
        registrar: Arc<dyn RouteRegistrar>,
    ) -> RegistrationDriverBuilder {
        RegistrationDriverBuilder {
            bus,
            registrar,
            router_id: Uuid::new_v4(),
            hosts: Vec::new(),
            register_interval: DEFAULT_REGISTER_INTERVAL,
            heartbeat_interval: None,
        }
    }

    /// The descriptor advertised to peers.
    pub fn descriptor(&self) -> &RouterDescriptor {
        &self.descriptor
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Subscribe to the control plane and begin heartbeating.
    ///
    /// Idempotent; a closed driver stays closed.
    pub fn start(&self) {
        if self.closed.load(Ordering::SeqCst) {
            tracing::warn!("Ignoring start on a closed registration driver");
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut subscriptions = self.subscriptions.lock();

        let last_heartbeat = Arc::clone(&self.last_heartbeat);
        subscriptions.push(self.bus.subscribe(
            subjects::PING,
            Arc::new(move |_| {
                *last_heartbeat.lock() = Some(Instant::now());
            }),
        ));

        let registrar = Arc::clone(&self.registrar);
        subscriptions.push(self.bus.subscribe(
            subjects::REGISTER,
            Arc::new(move |msg| {
                if let Some(announcement) = decode_announcement(&msg) {
                    let endpoint = announcement.endpoint();
                    for uri in &announcement.uris {
                        registrar.register_route(
                            uri,
                            endpoint.clone(),
                            announcement.app,
                            announcement.index,
                            announcement.private_instance_id.as_deref(),
                        );
                    }
                }
            }),
        ));

        let registrar = Arc::clone(&self.registrar);
        subscriptions.push(self.bus.subscribe(
            subjects::UNREGISTER,
            Arc::new(move |msg| {
                if let Some(announcement) = decode_announcement(&msg) {
                    let endpoint = announcement.endpoint();
                    for uri in &announcement.uris {
                        registrar.unregister_route(uri, &endpoint);
                    }
                }
            }),
        ));

        let bus = Arc::clone(&self.bus);
        let payload = self.descriptor_payload.clone();
        subscriptions.push(self.bus.subscribe(
            subjects::GREET,
            Arc::new(move |msg| {
                if let Some(reply_to) = msg.reply_to.as_deref() {
                    bus.publish(reply_to, payload.clone());
                }
            }),
        ));

        let bus = Arc::clone(&self.bus);
        let payload = self.descriptor_payload.clone();
        subscriptions.push(self.bus.on_reconnect(Arc::new(move || {
            tracing::info!("Bus reconnected, republishing router descriptor");
            bus.publish(subjects::START, payload.clone());
        })));

        let bus = Arc::clone(&self.bus);
        let interval = self.heartbeat_interval;
        *self.heartbeat_task.lock() = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                bus.publish(subjects::PING, EMPTY_BODY.to_vec());
            }
        }));

        self.bus
            .publish(subjects::START, self.descriptor_payload.clone());
        tracing::info!(
            router_id = %self.descriptor.id,
            heartbeat_interval_secs = self.heartbeat_interval.as_secs(),
            "Listening for route updates on the control plane"
        );
    }

    /// Tear down subscriptions and stop heartbeating.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for id in self.subscriptions.lock().drain(..) {
            self.bus.unsubscribe(id);
        }
        if let Some(task) = self.heartbeat_task.lock().take() {
            task.abort();
        }
        if self.started.load(Ordering::SeqCst) {
            tracing::info!("Registration driver closed");
        }
    }
}

impl RouteSource for RegistrationDriver {
    /// Self-health: started, bus connected, and a heartbeat reply seen
    /// within twice the heartbeat interval. The double interval tolerates
    /// one missed round-trip before the route source is declared stale.
    fn is_available(&self) -> bool {
        if !self.is_started() || self.closed.load(Ordering::SeqCst) || !self.bus.is_connected() {
            return false;
        }
        self.last_heartbeat
            .lock()
            .is_some_and(|at| at.elapsed() < self.heartbeat_interval * 2)
    }
}

impl Drop for RegistrationDriver {
    fn drop(&mut self) {
        self.close();
    }
}

/// Decode an announcement, dropping the message on a protocol fault.
/// Later messages on the subscription are unaffected.
fn decode_announcement(msg: &crate::bus::BusMessage) -> Option<RouteAnnouncement> {
    match serde_json::from_slice::<RouteAnnouncement>(&msg.payload) {
        Ok(announcement) => Some(announcement),
        Err(error) => {
            tracing::warn!(subject = %msg.subject, %error, "Dropping malformed announcement");
            None
        }
    }
}
