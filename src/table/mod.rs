//! Routing table subsystem.
//!
//! # Data Flow
//! ```text
//! Registration protocol driver
//!     → insert/register/unregister (route.rs value types)
//!     → table.rs (bucket mutation under lock, reverse index update)
//!     → events.rs (register/unregister snapshots to the event sink)
//!
//! Eviction:
//!     evictor.rs (periodic tick)
//!     → availability gate
//!     → table.rs sweep → unregister events
//! ```
//!
//! # Design Decisions
//! - One mutex over the host buckets; mutation rate is registration
//!   frequency, so contention is not a concern
//! - Endpoint reverse lookups bypass the table lock via a DashMap
//! - Host keys are normalized to lowercase on every entry point

mod evictor;
pub mod events;
pub mod route;
#[allow(clippy::module_inception)]
pub mod table;

pub use events::{EventSink, LoggingEventSink, RouteEvent};
pub use route::{Endpoint, RouteDetails};
pub use table::{RouteRegistrar, RoutingTable};
