//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Table and driver produce:
//!     → tracing events (structured log fields)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! Logging is initialized in `main.rs` via `tracing-subscriber`; metric
//! updates are cheap atomic operations safe to call from under the table
//! lock.

pub mod metrics;
