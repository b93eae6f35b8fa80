//! Message-bus boundary.
//!
//! # Data Flow
//! ```text
//! Control plane peers
//!     → bus transport (out of scope, behind the MessageBus trait)
//!     → subscribed handlers (messages.rs wire types)
//!     → registration driver → routing table
//! ```
//!
//! # Design Decisions
//! - The trait is transport-agnostic; deployments supply an implementation
//!   over their broker, tests and single-process wiring use memory.rs
//! - Handlers for one subscription are invoked serially, in publish order;
//!   implementations must preserve this so control-plane messages are
//!   processed in order regardless of transport-level concurrency
//! - Reconnect notification is callback-based, mirroring subscribe

pub mod memory;
pub mod messages;

use std::sync::Arc;

/// An inbound bus message.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub subject: String,
    /// Subject the publisher expects a reply on, if any.
    pub reply_to: Option<String>,
    pub payload: Vec<u8>,
}

/// Handle for cancelling a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub type MessageHandler = Arc<dyn Fn(BusMessage) + Send + Sync>;
pub type ReconnectHandler = Arc<dyn Fn() + Send + Sync>;

/// Publish/subscribe transport used by the registration protocol.
pub trait MessageBus: Send + Sync {
    fn publish(&self, subject: &str, payload: Vec<u8>);

    /// Publish a request that expects a reply on `reply_to`.
    fn publish_with_reply(&self, subject: &str, payload: Vec<u8>, reply_to: &str);

    /// Subscribe to a subject. The handler is invoked serially, in publish
    /// order, for every message on the subject.
    fn subscribe(&self, subject: &str, handler: MessageHandler) -> SubscriptionId;

    /// Register a callback fired whenever the underlying connection is
    /// re-established after a drop.
    fn on_reconnect(&self, handler: ReconnectHandler) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Whether the bus currently considers itself connected.
    fn is_connected(&self) -> bool;
}
