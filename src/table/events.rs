//! Route change events and their delivery seam.
//!
//! # Responsibilities
//! - Carry full route snapshots for register/unregister changes
//! - Define the `EventSink` seam the table publishes through
//! - Provide a logging sink for hosts that want nothing fancier
//!
//! Delivery order and fan-out to multiple listeners are the sink's
//! concern, not the table's.

use crate::table::route::RouteDetails;

/// A change to the routing table, carrying a snapshot of the affected route.
#[derive(Debug, Clone)]
pub enum RouteEvent {
    /// A route was added, or an existing route's registration changed.
    Registered(RouteDetails),
    /// A route was removed, explicitly or by the stale-route sweep.
    /// `last` is true iff this removal emptied the host's final endpoint.
    Unregistered { route: RouteDetails, last: bool },
}

/// Receiver of route change events.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: RouteEvent);
}

/// Sink that logs every route change.
#[derive(Debug, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn publish(&self, event: RouteEvent) {
        match event {
            RouteEvent::Registered(route) => {
                tracing::info!(
                    host = %route.host,
                    endpoint = %route.endpoint,
                    application_id = ?route.application_id,
                    "Registered route"
                );
            }
            RouteEvent::Unregistered { route, last } => {
                tracing::info!(
                    host = %route.host,
                    endpoint = %route.endpoint,
                    last,
                    "Unregistered route"
                );
            }
        }
    }
}
