//! Registration protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Bus subscriptions (register / unregister / greet / ping)
//!     → driver.rs handlers
//!     → routing table mutation, descriptor replies, heartbeat receipts
//!
//! Heartbeat loop:
//!     periodic ping publish → bus loopback → receipt timestamp
//!     → is_available (consumed by the availability aggregator)
//! ```

pub mod driver;

pub use driver::{RegistrationDriver, RegistrationDriverBuilder};
