//! # Relay
//!
//! Forwards what one bus receives to the targets of another, for a context
//! that sits between a host and its own embedded guests.
//!
//! Only `Scope::Broadcast` envelopes cross a relay. `Local` and `External`
//! envelopes stop at the first hop.

use std::sync::Arc;

use bridge_types::{Envelope, Topic};
use tracing::debug;

use crate::bus::MessageBus;
use crate::subscriptions::SubscriptionToken;

/// Scope-enforcing forwarder between two buses.
pub struct Relay;

impl Relay {
    /// Forward every authenticated envelope `inbound` receives to the targets
    /// of `outbound`, scope permitting.
    ///
    /// Holds `outbound` weakly. Unsubscribe the returned token to stop
    /// relaying.
    pub fn bridge<I, O>(inbound: &I, outbound: Arc<O>) -> SubscriptionToken
    where
        I: MessageBus + ?Sized,
        O: MessageBus + 'static,
    {
        let metrics = inbound.channel().metrics().clone();
        let from = inbound.role();
        let to = Arc::downgrade(&outbound);

        inbound.subscribe_envelope(
            Topic::All,
            Arc::new(move |envelope: &Envelope| {
                if !envelope.scope().is_relayable() {
                    debug!(
                        topic = %envelope.topic(),
                        scope = %envelope.scope(),
                        "Envelope not relayable, dropped"
                    );
                    metrics.record_relay_dropped();
                    return;
                }
                let Some(outbound) = to.upgrade() else {
                    return;
                };
                let delivered = outbound.channel().publish(envelope.clone());
                debug!(%from, to = %outbound.role(), topic = %envelope.topic(), delivered, "Envelope relayed");
            }),
        )
    }
}
