//! Route registry daemon.
//!
//! Wires the routing table, the registration protocol driver, and the
//! availability gate, then runs until a shutdown signal arrives.
//!
//! # Architecture Overview
//!
//! ```text
//!   Control plane bus ──▶ registration driver ──▶ routing table ──▶ event sink
//!                               │                      ▲
//!                          heartbeats                  │ sweep (gated)
//!                               │                      │
//!                               └──▶ availability ──▶ evictor
//! ```

use clap::Parser;
use route_registry::bus::memory::MemoryBus;
use route_registry::config::loader::load_config;
use route_registry::config::RegistryConfig;
use route_registry::lifecycle::signals;
use route_registry::observability::metrics;
use route_registry::table::LoggingEventSink;
use route_registry::{AvailabilityAggregator, RegistrationDriver, RoutingTable, Shutdown};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "route-registry", about = "Route registry daemon")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when absent.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "route_registry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("route-registry v0.1.0 starting");

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RegistryConfig::default(),
    };

    tracing::info!(
        stale_route_timeout_secs = config.table.stale_route_timeout_secs,
        eviction_interval_secs = config.table.eviction_interval_secs,
        register_interval_secs = config.registration.register_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    // In-process bus; a production deployment plugs a transport-backed
    // MessageBus implementation in here.
    let bus = Arc::new(MemoryBus::new());
    let sink = Arc::new(LoggingEventSink);
    let availability = AvailabilityAggregator::new();

    let table = Arc::new(RoutingTable::new(
        sink,
        Duration::from_secs(config.table.stale_route_timeout_secs),
        availability.clone(),
    ));

    let mut builder = RegistrationDriver::builder(bus, table.clone())
        .register_interval(Duration::from_secs(config.registration.register_interval_secs));
    if let Some(id) = config.registration.router_id {
        builder = builder.router_id(id);
    }
    if let Some(heartbeat) = config.registration.heartbeat_interval_secs {
        builder = builder.heartbeat_interval(Duration::from_secs(heartbeat));
    }
    for host in &config.registration.hosts {
        builder = builder.add_host(host.clone());
    }
    let driver = Arc::new(builder.build());

    // Two-phase startup: wire the availability gate before anything runs,
    // so the first sweep already sees the driver's health signal.
    availability.add_provider(driver.clone());
    table.clone().start(
        Duration::from_secs(config.table.eviction_interval_secs),
        &shutdown,
    );
    driver.start();

    tracing::info!(router_id = %driver.descriptor().id, "Route registry running");

    signals::shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    shutdown.trigger();
    driver.close();
    table.close();

    tracing::info!("Shutdown complete");
    Ok(())
}
