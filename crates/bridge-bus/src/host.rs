//! # Host Bus
//!
//! The bus of the application that embeds guests. It drives the handshake:
//! guests check in, the host tells them to enter or leave in-context editing
//! and asks them to reload or navigate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bridge_types::{Envelope, Scope, Topic};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::info;

use crate::bus::{Channel, Gate, MessageBus, MessageSource, ProcessEnvelope, Role};
use crate::error::BusError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::subscriptions::{self, EnvelopeHandler, SharedTable, SubscriptionTable, SubscriptionToken};

#[derive(Debug)]
struct HostInner {
    channel: Channel,
    table: SharedTable,
    guest_check_ins: AtomicU64,
}

impl ProcessEnvelope for HostInner {
    fn channel(&self) -> &Channel {
        &self.channel
    }

    fn process(&self, envelope: Envelope) {
        if envelope.topic() == Topic::GuestCheckIn {
            let total = self.guest_check_ins.fetch_add(1, Ordering::Relaxed) + 1;
            info!(check_ins = total, "Guest checked in");
        }
        subscriptions::dispatch(&self.table, &envelope, self.channel.metrics().as_ref());
    }
}

/// Host-side bus.
#[derive(Debug)]
pub struct HostBus {
    inner: Arc<HostInner>,
}

impl HostBus {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(NoOpMetrics))
    }

    pub fn with_metrics(metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            inner: Arc::new(HostInner {
                channel: Channel::new(Role::Host, metrics),
                table: Arc::new(Mutex::new(SubscriptionTable::new())),
                guest_check_ins: AtomicU64::new(0),
            }),
        }
    }

    /// Ask guests to enter in-context editing.
    pub fn start_ice(&self, data: Value) -> usize {
        self.publish(Topic::StartIce, data, Scope::External)
    }

    /// Ask guests to leave in-context editing.
    pub fn end_ice(&self, data: Value) -> usize {
        self.publish(Topic::EndIce, data, Scope::External)
    }

    /// Ask guests to reload their content.
    pub fn request_reload(&self) -> usize {
        self.publish(Topic::GuestReloadRequest, Value::Null, Scope::External)
    }

    /// Ask guests to navigate to `url`.
    pub fn request_navigation(&self, url: &str) -> usize {
        self.publish(Topic::GuestNavRequest, json!({ "url": url }), Scope::External)
    }

    /// Authenticated check-ins received so far.
    pub fn guest_check_ins(&self) -> u64 {
        self.inner.guest_check_ins.load(Ordering::Relaxed)
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.table.lock().len()
    }
}

impl Default for HostBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for HostBus {
    fn channel(&self) -> &Channel {
        &self.inner.channel
    }

    fn subscribe_envelope(&self, topic: Topic, handler: EnvelopeHandler) -> SubscriptionToken {
        subscriptions::subscribe(&self.inner.table, topic, handler)
    }

    fn open(&self, source: Arc<dyn MessageSource>) -> Result<(), BusError> {
        Gate::install(&self.inner, source)
    }
}

impl Drop for HostBus {
    fn drop(&mut self) {
        self.close();
    }
}
