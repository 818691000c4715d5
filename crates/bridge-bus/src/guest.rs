//! # Guest Bus
//!
//! The bus of an embedded context, e.g. the live preview. It announces itself
//! with a check-in and follows the host's in-context editing (ICE) commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_types::{Envelope, Scope, Topic};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::info;

use crate::bus::{Channel, Gate, MessageBus, MessageSource, ProcessEnvelope, Role};
use crate::error::BusError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::subscriptions::{self, EnvelopeHandler, SharedTable, SubscriptionTable, SubscriptionToken};

#[derive(Debug)]
struct GuestInner {
    channel: Channel,
    table: SharedTable,
    ice_active: AtomicBool,
}

impl ProcessEnvelope for GuestInner {
    fn channel(&self) -> &Channel {
        &self.channel
    }

    fn process(&self, envelope: Envelope) {
        match envelope.topic() {
            Topic::StartIce => {
                if !self.ice_active.swap(true, Ordering::Relaxed) {
                    info!("Entering in-context editing");
                }
            }
            Topic::EndIce => {
                if self.ice_active.swap(false, Ordering::Relaxed) {
                    info!("Leaving in-context editing");
                }
            }
            _ => {}
        }
        subscriptions::dispatch(&self.table, &envelope, self.channel.metrics().as_ref());
    }
}

/// Guest-side bus.
#[derive(Debug)]
pub struct GuestBus {
    inner: Arc<GuestInner>,
}

impl GuestBus {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(NoOpMetrics))
    }

    pub fn with_metrics(metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            inner: Arc::new(GuestInner {
                channel: Channel::new(Role::Guest, metrics),
                table: Arc::new(Mutex::new(SubscriptionTable::new())),
                ice_active: AtomicBool::new(false),
            }),
        }
    }

    /// Announce readiness to the host.
    pub fn check_in(&self, data: Value) -> usize {
        self.publish(Topic::GuestCheckIn, data, Scope::External)
    }

    /// Whether the host has put this guest into in-context editing.
    pub fn is_ice_active(&self) -> bool {
        self.inner.ice_active.load(Ordering::Relaxed)
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.table.lock().len()
    }
}

impl Default for GuestBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for GuestBus {
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

impl Drop for GuestBus {
    fn drop(&mut self) {
        self.close();
    }
}
