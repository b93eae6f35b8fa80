//! Route registry core for an HTTP router.
//!
//! A concurrent, in-memory mapping from virtual host names to sets of
//! backend endpoints, kept fresh by a pub/sub control-plane protocol and
//! automatically pruned when backends stop announcing themselves.

// Core subsystems
pub mod bus;
pub mod config;
pub mod registration;
pub mod table;

// Cross-cutting concerns
pub mod availability;
pub mod lifecycle;
pub mod observability;

pub use availability::{AvailabilityAggregator, RouteSource};
pub use config::RegistryConfig;
pub use lifecycle::Shutdown;
pub use registration::RegistrationDriver;
pub use table::{Endpoint, EventSink, RouteDetails, RouteEvent, RouteRegistrar, RoutingTable};
