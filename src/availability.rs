//! Control-plane availability signals.
//!
//! # Responsibilities
//! - Define the `RouteSource` capability: "is this source of route
//!   information currently healthy?"
//! - Combine independent sources with AND semantics
//!
//! The aggregator gates destructive table operations: the stale-route
//! sweep runs only while every registered source reports available, so a
//! control-plane outage can never look like mass route expiry.

use parking_lot::RwLock;
use std::sync::Arc;

/// A source of route information that knows whether it is currently healthy.
pub trait RouteSource: Send + Sync {
    fn is_available(&self) -> bool;
}

/// AND-composition over an explicit set of route sources.
///
/// Providers are added during wiring, before anything that consults the
/// aggregator is started; there is no runtime discovery. An aggregator
/// with no providers is vacuously available.
#[derive(Clone, Default)]
pub struct AvailabilityAggregator {
    providers: Arc<RwLock<Vec<Arc<dyn RouteSource>>>>,
}

impl AvailabilityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Intended for wiring time only.
    pub fn add_provider(&self, provider: Arc<dyn RouteSource>) {
        self.providers.write().push(provider);
    }

    /// True iff every registered provider reports available.
    pub fn is_available(&self) -> bool {
        self.providers.read().iter().all(|p| p.is_available())
    }
}

impl RouteSource for AvailabilityAggregator {
    fn is_available(&self) -> bool {
        AvailabilityAggregator::is_available(self)
    }
}
