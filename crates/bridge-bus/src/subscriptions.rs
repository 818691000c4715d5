//! # Topic Subscription Table
//!
//! Maps topics to the handlers registered for them.
//!
//! Dispatch order for one inbound envelope is fixed: handlers subscribed to
//! the exact topic in registration order, then wildcard handlers in
//! registration order. Dispatch works on a snapshot, so a handler that
//! subscribes or unsubscribes while running only affects later messages.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use bridge_types::{Envelope, Topic};
use parking_lot::Mutex;
use tracing::debug;

use crate::metrics::MetricsRecorder;

/// A subscriber callback. Receives the whole envelope; the public
/// `subscribe` wraps data-only handlers into this shape.
pub type EnvelopeHandler = Arc<dyn Fn(&Envelope) + Send + Sync>;

/// Identifies one registration within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Registration {
    id: SubscriptionId,
    handler: EnvelopeHandler,
}

/// Per-topic handler lists.
#[derive(Default)]
pub struct SubscriptionTable {
    by_topic: HashMap<Topic, Vec<Registration>>,
    next_id: u64,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, topic: Topic, handler: EnvelopeHandler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.by_topic
            .entry(topic)
            .or_default()
            .push(Registration { id, handler });
        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn remove(&mut self, topic: Topic, id: SubscriptionId) -> bool {
        let Some(registrations) = self.by_topic.get_mut(&topic) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            self.by_topic.remove(&topic);
        }
        removed
    }

    /// Handlers to run for an envelope with `topic`, in dispatch order.
    pub fn handlers_for(&self, topic: Topic) -> Vec<EnvelopeHandler> {
        let exact = self.by_topic.get(&topic).into_iter().flatten();
        let wildcard = if topic.is_wildcard() {
            None
        } else {
            self.by_topic.get(&Topic::All)
        };

        exact
            .chain(wildcard.into_iter().flatten())
            .map(|r| r.handler.clone())
            .collect()
    }

    /// Number of handlers registered for exactly `topic`.
    pub fn count(&self, topic: Topic) -> usize {
        self.by_topic.get(&topic).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.by_topic.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }
}

impl fmt::Debug for SubscriptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<Topic, usize> = self
            .by_topic
            .iter()
            .map(|(topic, regs)| (*topic, regs.len()))
            .collect();
        f.debug_struct("SubscriptionTable")
            .field("counts", &counts)
            .finish()
    }
}

/// Shared table owned by one role variant.
pub(crate) type SharedTable = Arc<Mutex<SubscriptionTable>>;

/// Register `handler` and hand back a token bound to `table`.
pub(crate) fn subscribe(table: &SharedTable, topic: Topic, handler: EnvelopeHandler) -> SubscriptionToken {
    let id = table.lock().insert(topic, handler);
    debug!(%topic, ?id, "Subscription created");
    SubscriptionToken {
        id,
        topic,
        table: Arc::downgrade(table),
    }
}

/// Run every matching handler for `envelope`. Returns how many ran.
pub(crate) fn dispatch(table: &SharedTable, envelope: &Envelope, metrics: &dyn MetricsRecorder) -> usize {
    // Lock released before any handler runs.
    let handlers = table.lock().handlers_for(envelope.topic());

    if handlers.is_empty() {
        debug!(topic = %envelope.topic(), "No subscriber for topic, message dropped");
        metrics.record_unmatched();
        return 0;
    }

    for handler in &handlers {
        handler(envelope);
    }
    metrics.record_dispatched(handlers.len());
    handlers.len()
}

/// Handle returned by `subscribe`.
///
/// Dropping the token does not unsubscribe. Call `unsubscribe` to remove the
/// registration; further calls are no-ops.
pub struct SubscriptionToken {
    id: SubscriptionId,
    topic: Topic,
    table: Weak<Mutex<SubscriptionTable>>,
}

impl SubscriptionToken {
    /// Remove the registration. Returns `true` only on the call that removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(table) = self.table.upgrade() else {
            return false;
        };
        let removed = table.lock().remove(self.topic, self.id);
        if removed {
            debug!(topic = %self.topic, id = ?self.id, "Subscription removed");
        }
        removed
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}

impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionToken")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}
