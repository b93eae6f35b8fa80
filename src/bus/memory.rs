//! In-process message bus.
//!
//! Used by the test suites and by single-process wiring. Dispatch is
//! synchronous on the publishing task, which trivially satisfies the
//! serial in-order delivery contract and keeps tests deterministic.
//! Connectivity and reconnects can be simulated for driver testing.

use crate::bus::{BusMessage, MessageBus, MessageHandler, ReconnectHandler, SubscriptionId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

struct Subscription {
    id: SubscriptionId,
    subject: String,
    handler: MessageHandler,
}

struct ReconnectSubscription {
    id: SubscriptionId,
    handler: ReconnectHandler,
}

#[derive(Default)]
struct Inner {
    subscriptions: Mutex<Vec<Subscription>>,
    reconnect_handlers: Mutex<Vec<ReconnectSubscription>>,
    next_id: AtomicU64,
    connected: AtomicBool,
}

/// A bus whose publishers and subscribers live in the same process.
#[derive(Clone, Default)]
pub struct MemoryBus {
    inner: Arc<Inner>,
}

impl MemoryBus {
    pub fn new() -> Self {
        let bus = Self::default();
        bus.inner.connected.store(true, Ordering::Relaxed);
        bus
    }

    /// Simulate a transport-level connectivity change. While disconnected
    /// the bus drops published messages, like a broker client with no
    /// server to hand them to.
    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::Relaxed);
    }

    /// Simulate the transport re-establishing its connection: marks the
    /// bus connected and fires every reconnect callback.
    pub fn simulate_reconnect(&self) {
        self.inner.connected.store(true, Ordering::Relaxed);
        let handlers: Vec<ReconnectHandler> = self
            .inner
            .reconnect_handlers
            .lock()
            .iter()
            .map(|s| Arc::clone(&s.handler))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn dispatch(&self, message: BusMessage) {
        if !self.is_connected() {
            return;
        }
        // Collect matching handlers before invoking them, so a handler may
        // publish (greet replies) or unsubscribe without deadlocking.
        let handlers: Vec<MessageHandler> = self
            .inner
            .subscriptions
            .lock()
            .iter()
            .filter(|s| s.subject == message.subject)
            .map(|s| Arc::clone(&s.handler))
            .collect();
        for handler in handlers {
            handler(message.clone());
        }
    }
}

impl MessageBus for MemoryBus {
    fn publish(&self, subject: &str, payload: Vec<u8>) {
        self.dispatch(BusMessage {
            subject: subject.to_string(),
            reply_to: None,
            payload,
        });
    }

    fn publish_with_reply(&self, subject: &str, payload: Vec<u8>, reply_to: &str) {
        self.dispatch(BusMessage {
            subject: subject.to_string(),
            reply_to: Some(reply_to.to_string()),
            payload,
        });
    }

    fn subscribe(&self, subject: &str, handler: MessageHandler) -> SubscriptionId {
        let id = self.next_id();
        self.inner.subscriptions.lock().push(Subscription {
            id,
            subject: subject.to_string(),
            handler,
        });
        id
    }

    fn on_reconnect(&self, handler: ReconnectHandler) -> SubscriptionId {
        let id = self.next_id();
        self.inner
            .reconnect_handlers
            .lock()
            .push(ReconnectSubscription { id, handler });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscriptions.lock().retain(|s| s.id != id);
        self.inner.reconnect_handlers.lock().retain(|s| s.id != id);
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }
}
