//! The routing table.
//!
//! # Responsibilities
//! - Own the host → endpoint → route buckets and the endpoint reverse index
//! - Apply insert/register/unregister mutations and emit change events
//! - Sweep stale routes, gated by control-plane availability
//!
//! # Concurrency
//! The bucket structure is guarded by a single mutex; mutation rate is
//! registration frequency, not request rate, so coarse locking is fine.
//! The reverse index is a `DashMap` and is read without the table lock,
//! since endpoint lookup sits on the request hot path of the proxy layer
//! that consults this table.

use crate::availability::AvailabilityAggregator;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::table::evictor::StaleRouteEvictor;
use crate::table::events::{EventSink, RouteEvent};
use crate::table::route::{Endpoint, RouteDetails};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Mutation and lookup surface of the routing table.
///
/// The registration protocol driver depends on this trait rather than on
/// the concrete table, which also keeps the driver testable against a
/// recording fake.
pub trait RouteRegistrar: Send + Sync {
    /// Add or refresh a route without emitting an event. Used for bulk or
    /// initial population where change notification is undesired.
    fn insert_route(
        &self,
        host: &str,
        endpoint: Endpoint,
        application_id: Option<Uuid>,
        application_index: Option<u32>,
        private_instance_id: Option<&str>,
    );

    /// Add or refresh a route. Emits a register event when the route is new
    /// or its registration changed; otherwise only refreshes the timestamp.
    fn register_route(
        &self,
        host: &str,
        endpoint: Endpoint,
        application_id: Option<Uuid>,
        application_index: Option<u32>,
        private_instance_id: Option<&str>,
    );

    /// Remove a route if present. Returns whether anything was removed.
    fn unregister_route(&self, host: &str, endpoint: &Endpoint) -> bool;

    /// Reverse lookup by endpoint, independent of host-bucket locking.
    fn route_by_endpoint(&self, endpoint: &Endpoint) -> Option<RouteDetails>;
}

type HostBuckets = HashMap<String, HashMap<Endpoint, RouteDetails>>;

/// Concurrent mapping from virtual host names to sets of backend endpoints.
pub struct RoutingTable {
    buckets: Mutex<HostBuckets>,
    by_endpoint: DashMap<Endpoint, RouteDetails>,
    sink: Arc<dyn EventSink>,
    stale_route_timeout: Duration,
    availability: AvailabilityAggregator,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RoutingTable {
    pub fn new(
        sink: Arc<dyn EventSink>,
        stale_route_timeout: Duration,
        availability: AvailabilityAggregator,
    ) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            by_endpoint: DashMap::new(),
            sink,
            stale_route_timeout,
            availability,
            sweeper: Mutex::new(None),
        }
    }

    /// Spawn the periodic stale-route sweep. Calling twice is a no-op.
    pub fn start(self: Arc<Self>, eviction_interval: Duration, shutdown: &Shutdown) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return;
        }
        let evictor = StaleRouteEvictor::new(Arc::clone(&self), eviction_interval);
        *sweeper = Some(tokio::spawn(evictor.run(shutdown.subscribe())));
    }

    /// Cancel the periodic sweep. Safe to call repeatedly or if `start`
    /// was never called.
    pub fn close(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }

    /// Point-in-time snapshot of the routes registered for `host`.
    pub fn routes(&self, host: &str) -> Vec<RouteDetails> {
        let host = host.to_ascii_lowercase();
        let buckets = self.buckets.lock();
        buckets
            .get(&host)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove every route whose last update is older than the stale-route
    /// timeout, emitting an unregister event per removal.
    ///
    /// Returns the number of routes removed, or -1 when the sweep was
    /// skipped because a route source is unavailable. Skipping is the
    /// safety behavior: staleness data sourced from a disconnected control
    /// plane cannot be trusted, and evicting on it would empty the table
    /// during an outage.
    pub fn cleanup_stale_routes(&self) -> i64 {
        if !self.availability.is_available() {
            metrics::record_control_plane_available(false);
            tracing::debug!("Route source unavailable, skipping stale route sweep");
            return -1;
        }
        metrics::record_control_plane_available(true);

        let now = Instant::now();
        let mut removed = 0i64;
        let mut buckets = self.buckets.lock();
        let hosts: Vec<String> = buckets.keys().cloned().collect();
        for host in hosts {
            let Some(bucket) = buckets.get_mut(&host) else {
                continue;
            };
            let stale: Vec<Endpoint> = bucket
                .iter()
                .filter(|(_, route)| now.duration_since(route.last_updated) > self.stale_route_timeout)
                .map(|(endpoint, _)| endpoint.clone())
                .collect();
            for endpoint in stale {
                if let Some(route) = bucket.remove(&endpoint) {
                    removed += 1;
                    let last = bucket.is_empty();
                    self.drop_index_entry(&route);
                    metrics::record_route_unregistered("evicted");
                    self.sink
                        .publish(RouteEvent::Unregistered { route, last });
                }
            }
            if bucket.is_empty() {
                buckets.remove(&host);
            }
        }
        metrics::record_table_size(Self::total_routes(&buckets));
        removed
    }

    /// Total number of registered routes across all hosts.
    pub fn len(&self) -> usize {
        Self::total_routes(&self.buckets.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }

    fn total_routes(buckets: &HostBuckets) -> usize {
        buckets.values().map(HashMap::len).sum()
    }

    /// Remove the reverse-index entry for `route`, but only when the index
    /// still points at the same host. An endpoint shared across hosts is
    /// last-writer-wins in the index.
    fn drop_index_entry(&self, route: &RouteDetails) {
        self.by_endpoint
            .remove_if(&route.endpoint, |_, indexed| indexed.host == route.host);
    }

    fn upsert(
        &self,
        host: &str,
        endpoint: Endpoint,
        application_id: Option<Uuid>,
        application_index: Option<u32>,
        private_instance_id: Option<&str>,
        emit: bool,
    ) {
        let host = host.to_ascii_lowercase();
        let mut buckets = self.buckets.lock();
        // Timestamps are taken under the lock so they only ever advance.
        let new_route = RouteDetails {
            endpoint: endpoint.clone(),
            application_id,
            application_index,
            host: host.clone(),
            private_instance_id: private_instance_id.map(str::to_string),
            last_updated: Instant::now(),
        };
        let bucket = buckets.entry(host).or_default();
        match bucket.get_mut(&endpoint) {
            None => {
                bucket.insert(endpoint.clone(), new_route.clone());
                self.by_endpoint.insert(endpoint, new_route.clone());
                metrics::record_route_registered();
                if emit {
                    self.sink.publish(RouteEvent::Registered(new_route));
                }
            }
            Some(existing) if !existing.same_registration(&new_route) => {
                *existing = new_route.clone();
                self.by_endpoint.insert(endpoint, new_route.clone());
                if emit {
                    self.sink.publish(RouteEvent::Registered(new_route));
                }
            }
            Some(existing) => {
                // Same registration announced again: refresh freshness only.
                // The stored attributes (including an index-only change) are
                // kept as-is; see RouteDetails::same_registration.
                existing.last_updated = new_route.last_updated;
                self.by_endpoint.insert(endpoint, existing.clone());
            }
        }
        metrics::record_table_size(Self::total_routes(&buckets));
    }
}

impl RouteRegistrar for RoutingTable {
    fn insert_route(
        &self,
        host: &str,
        endpoint: Endpoint,
        application_id: Option<Uuid>,
        application_index: Option<u32>,
        private_instance_id: Option<&str>,
    ) {
        self.upsert(
            host,
            endpoint,
            application_id,
            application_index,
            private_instance_id,
            false,
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
        self.upsert(
            host,
            endpoint,
            application_id,
            application_index,
            private_instance_id,
            true,
        );
    }

    fn unregister_route(&self, host: &str, endpoint: &Endpoint) -> bool {
        let host = host.to_ascii_lowercase();
        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get_mut(&host) else {
            return false;
        };
        let Some(route) = bucket.remove(endpoint) else {
            return false;
        };
        let last = bucket.is_empty();
        if last {
            buckets.remove(&host);
        }
        self.drop_index_entry(&route);
        metrics::record_route_unregistered("unregister");
        metrics::record_table_size(Self::total_routes(&buckets));
        self.sink.publish(RouteEvent::Unregistered { route, last });
        true
    }

    fn route_by_endpoint(&self, endpoint: &Endpoint) -> Option<RouteDetails> {
        self.by_endpoint
            .get(endpoint)
            .map(|entry| entry.value().clone())
    }
}

impl Drop for RoutingTable {
    fn drop(&mut self) {
        self.close();
    }
}
