//! # Message Bus Core
//!
//! The contract shared by both role variants and the pieces they compose:
//!
//! - `Channel`: Target Registry + Origin Allowlist + the publish loop and the
//!   inbound gate. Each variant owns one; nothing is inherited.
//! - `MessageBus`: the one interface `HostBus` and `GuestBus` implement.
//! - `MessageSource` / `InboundListener`: the seam to the hosting
//!   environment's receive side.
//!
//! ## Lifecycle
//!
//! Constructing a bus touches nothing outside it. `open` installs the bus as
//! the inbound listener of a source; `close` (or dropping the bus) removes it.

use std::fmt;
use std::sync::{Arc, Weak};

use bridge_types::{Envelope, Origin, Scope, Topic};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::BusError;
use crate::metrics::MetricsRecorder;
use crate::origins::OriginAllowlist;
use crate::subscriptions::{EnvelopeHandler, SubscriptionToken};
use crate::targets::{Target, TargetKey, TargetRegistry};

/// Which end of the handshake a bus plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Host,
    Guest,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Guest => f.write_str("guest"),
        }
    }
}

/// A raw message as the environment delivers it.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// The wire payload, expected to be an envelope but not trusted to be one.
    pub data: Value,
    /// Origin the environment claims for the sender. Supplied out-of-band,
    /// never read from `data`.
    pub origin: String,
}

/// Receives messages from a `MessageSource`.
pub trait InboundListener: Send + Sync {
    fn on_message(&self, message: InboundMessage);
}

/// Identifies one installed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// The hosting environment's receive side for one context.
///
/// Listeners are invoked later, on the context's own turn, never from inside
/// `add_listener` or from a sender's `post_message`.
pub trait MessageSource: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn InboundListener>) -> ListenerId;

    /// Returns `false` if the listener was not installed.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

struct Installed {
    source: Arc<dyn MessageSource>,
    id: ListenerId,
}

/// Registries plus the outbound loop and inbound gate.
pub struct Channel {
    role: Role,
    targets: Mutex<TargetRegistry>,
    origins: RwLock<OriginAllowlist>,
    metrics: Arc<dyn MetricsRecorder>,
    installed: Mutex<Option<Installed>>,
}

impl Channel {
    pub fn new(role: Role, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            role,
            targets: Mutex::new(TargetRegistry::new()),
            origins: RwLock::new(OriginAllowlist::new()),
            metrics,
            installed: Mutex::new(None),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsRecorder> {
        &self.metrics
    }

    // -------------------------------------------------------------------------
    // Targets
    // -------------------------------------------------------------------------

    pub fn add_target(&self, target: Arc<dyn Target>) {
        let key = target.key();
        self.targets.lock().add(target);
        debug!(role = %self.role, %key, "Target added");
    }

    pub fn remove_target(&self, key: TargetKey) -> bool {
        self.targets.lock().remove(key)
    }

    pub fn reset_targets(&self) {
        self.targets.lock().reset();
    }

    pub fn target_count(&self) -> usize {
        self.targets.lock().len()
    }

    pub fn has_target(&self, key: TargetKey) -> bool {
        self.targets.lock().contains(key)
    }

    // -------------------------------------------------------------------------
    // Origins
    // -------------------------------------------------------------------------

    pub fn add_origin(&self, origin: Origin) -> bool {
        self.origins.write().add(origin)
    }

    pub fn remove_origin(&self, origin: &Origin) -> bool {
        self.origins.write().remove(origin)
    }

    pub fn reset_origins(&self) {
        self.origins.write().reset();
    }

    pub fn origin_allowed(&self, claimed: &str) -> bool {
        self.origins.read().contains(claimed)
    }

    pub fn origins(&self) -> Vec<Origin> {
        self.origins.read().iter().cloned().collect()
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    /// Hand `envelope` to every live target. Returns how many received it.
    ///
    /// Targets that no longer resolve are evicted and skipped. Nothing is
    /// awaited and no local subscriber runs.
    pub fn publish(&self, envelope: Envelope) -> usize {
        // Registry lock released before delivery.
        let targets = self.targets.lock().snapshot();
        self.metrics.record_published(targets.len());

        let mut delivered = 0;
        for target in targets {
            match target.resolve() {
                Some(handle) => {
                    handle.post_message(&envelope);
                    self.metrics.record_delivered();
                    delivered += 1;
                }
                None => {
                    let key = target.key();
                    self.targets.lock().remove(key);
                    self.metrics.record_target_evicted();
                    debug!(role = %self.role, %key, "Target unreachable, evicted");
                }
            }
        }

        debug!(
            role = %self.role,
            topic = %envelope.topic(),
            scope = %envelope.scope(),
            delivered,
            "Envelope published"
        );
        delivered
    }

    // -------------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------------

    /// The authentication gate. Returns the decoded envelope only for an
    /// allowlisted origin and a recognisable envelope.
    pub fn admit(&self, message: &InboundMessage) -> Option<Envelope> {
        self.metrics.record_received();

        if !self.origin_allowed(&message.origin) {
            warn!(
                role = %self.role,
                origin = %message.origin,
                "Message received from a disallowed origin"
            );
            self.metrics.record_origin_rejected();
            return None;
        }

        match Envelope::from_wire(&message.data) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                debug!(role = %self.role, error = %e, "Unmatched message dropped");
                self.metrics.record_unmatched();
                None
            }
        }
    }

    /// Install `listener` on `source`.
    pub fn install(&self, source: Arc<dyn MessageSource>, listener: Arc<dyn InboundListener>) -> Result<(), BusError> {
        let mut installed = self.installed.lock();
        if installed.is_some() {
            return Err(BusError::AlreadyOpen { role: self.role });
        }

        let id = source.add_listener(listener);
        *installed = Some(Installed { source, id });
        info!(role = %self.role, "Bus opened");
        Ok(())
    }

    /// Remove the installed listener. Returns `false` if none was installed.
    pub fn uninstall(&self) -> bool {
        let Some(Installed { source, id }) = self.installed.lock().take() else {
            return false;
        };
        source.remove_listener(id);
        info!(role = %self.role, "Bus closed");
        true
    }

    pub fn is_open(&self) -> bool {
        self.installed.lock().is_some()
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("role", &self.role)
            .field("targets", &*self.targets.lock())
            .field("origins", &*self.origins.read())
            .field("open", &self.is_open())
            .finish()
    }
}

/// Role-specific processing of an authenticated envelope.
pub(crate) trait ProcessEnvelope: Send + Sync {
    fn channel(&self) -> &Channel;
    fn process(&self, envelope: Envelope);
}

/// Listener installed on the environment. Holds the variant weakly so the
/// environment never keeps a dropped bus alive.
pub(crate) struct Gate<P: ProcessEnvelope> {
    inner: Weak<P>,
}

impl<P: ProcessEnvelope + 'static> Gate<P> {
    pub(crate) fn install(inner: &Arc<P>, source: Arc<dyn MessageSource>) -> Result<(), BusError> {
        let gate = Arc::new(Gate {
            inner: Arc::downgrade(inner),
        });
        inner.channel().install(source, gate)
    }
}

impl<P: ProcessEnvelope> InboundListener for Gate<P> {
    fn on_message(&self, message: InboundMessage) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if let Some(envelope) = inner.channel().admit(&message) {
            inner.process(envelope);
        }
    }
}

/// The surface both role variants expose.
pub trait MessageBus: Send + Sync {
    fn channel(&self) -> &Channel;

    /// Register a handler that sees the whole envelope.
    fn subscribe_envelope(&self, topic: Topic, handler: EnvelopeHandler) -> SubscriptionToken;

    /// Install this bus as the inbound listener of `source`.
    ///
    /// # Errors
    ///
    /// `BusError::AlreadyOpen` if a listener is already installed.
    fn open(&self, source: Arc<dyn MessageSource>) -> Result<(), BusError>;

    fn role(&self) -> Role {
        self.channel().role()
    }

    /// Register a handler for `topic` (or `Topic::All`). It is called with the
    /// envelope's data.
    fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionToken
    where
        F: Fn(&Value) + Send + Sync + 'static,
        Self: Sized,
    {
        self.subscribe_envelope(topic, Arc::new(move |envelope: &Envelope| handler(envelope.data())))
    }

    fn publish(&self, topic: Topic, data: Value, scope: Scope) -> usize {
        self.channel().publish(Envelope::with_scope(topic, data, scope))
    }

    fn publish_broadcast(&self, topic: Topic, data: Value) -> usize {
        self.publish(topic, data, Scope::Broadcast)
    }

    fn add_target(&self, target: Arc<dyn Target>) {
        self.channel().add_target(target);
    }

    fn remove_target(&self, key: TargetKey) -> bool {
        self.channel().remove_target(key)
    }

    fn reset_targets(&self) {
        self.channel().reset_targets();
    }

    fn add_origin(&self, origin: Origin) -> bool {
        self.channel().add_origin(origin)
    }

    fn remove_origin(&self, origin: &Origin) -> bool {
        self.channel().remove_origin(origin)
    }

    fn reset_origins(&self) {
        self.channel().reset_origins();
    }

    fn close(&self) -> bool {
        self.channel().uninstall()
    }

    fn is_open(&self) -> bool {
        self.channel().is_open()
    }
}
