//! # Target Registry
//!
//! Non-owning references to the remote contexts a bus publishes to.
//!
//! The registry never creates or destroys a context. It only records handles
//! and later discards them, either explicitly or when a handle stops
//! resolving at send time.

use std::fmt;
use std::sync::Arc;

use bridge_types::Envelope;

/// Identity of the context a target refers to.
///
/// Two targets with the same key are the same target; registering the second
/// replaces the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey(u64);

impl TargetKey {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// The environment's fire-and-forget delivery primitive.
///
/// Implementations must not block and must not invoke the receiving side's
/// listeners synchronously; delivery happens on the receiver's own turn.
pub trait DeliveryHandle: Send + Sync {
    fn post_message(&self, envelope: &Envelope);
}

/// Something the bus can try to deliver to.
pub trait Target: Send + Sync {
    /// Identity of the underlying context.
    fn key(&self) -> TargetKey;

    /// Handle exposed directly by this target, if the context is still alive.
    fn handle(&self) -> Option<Arc<dyn DeliveryHandle>>;

    /// Handle of an inner context this target embeds (e.g. a frame's
    /// content window).
    fn content(&self) -> Option<Arc<dyn DeliveryHandle>> {
        None
    }

    /// Direct handle first, then the embedded one.
    fn resolve(&self) -> Option<Arc<dyn DeliveryHandle>> {
        self.handle().or_else(|| self.content())
    }
}

/// Insertion-ordered registry of targets, unique by key.
#[derive(Default)]
pub struct TargetRegistry {
    entries: Vec<Arc<dyn Target>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target, replacing any entry with the same key.
    pub fn add(&mut self, target: Arc<dyn Target>) {
        self.remove(target.key());
        self.entries.push(target);
    }

    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, key: TargetKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|t| t.key() != key);
        self.entries.len() != before
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: TargetKey) -> bool {
        self.entries.iter().any(|t| t.key() == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<TargetKey> {
        self.entries.iter().map(|t| t.key()).collect()
    }

    /// Copy of the current entries for the send loop, so the registry can be
    /// mutated (evictions, re-entrant adds) while delivery is in progress.
    pub fn snapshot(&self) -> Vec<Arc<dyn Target>> {
        self.entries.clone()
    }
}

impl fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
