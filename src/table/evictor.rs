//! Periodic stale-route sweep.

use crate::table::table::RoutingTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

/// Drives `RoutingTable::cleanup_stale_routes` at a fixed period.
///
/// The first sweep runs one full period after start, matching the grace
/// the stale-route timeout already gives freshly registered routes.
pub(crate) struct StaleRouteEvictor {
    table: Arc<RoutingTable>,
    interval: Duration,
}

impl StaleRouteEvictor {
    pub(crate) fn new(table: Arc<RoutingTable>, interval: Duration) -> Self {
        Self { table, interval }
    }

    pub(crate) async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let start = time::Instant::now() + self.interval;
        let mut ticker = time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Stale route evictor starting"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.table.cleanup_stale_routes();
                    if removed > 0 {
                        tracing::info!(removed, "Evicted stale routes");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Stale route evictor received shutdown signal, exiting");
                    break;
                }
            }
        }
    }
}
