//! # Origin Allowlist
//!
//! The set of origins whose messages this bus will accept.
//!
//! Membership is an exact string comparison against the claimed origin the
//! environment attaches to an inbound message. Nothing in the payload is ever
//! used to identify the sender.

use bridge_types::Origin;

/// Insertion-ordered set of trusted origins.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowlist {
    origins: Vec<Origin>,
}

impl OriginAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an origin. Returns `false` if it was already present.
    pub fn add(&mut self, origin: Origin) -> bool {
        if self.origins.contains(&origin) {
            return false;
        }
        self.origins.push(origin);
        true
    }

    /// Remove an origin. Returns `false` if it was not present.
    ///
    /// Takes an `Origin` so removal sees the same normalised form `add` stored.
    pub fn remove(&mut self, origin: &Origin) -> bool {
        let before = self.origins.len();
        self.origins.retain(|o| o != origin);
        self.origins.len() != before
    }

    pub fn reset(&mut self) {
        self.origins.clear();
    }

    /// Whether a claimed origin is trusted.
    pub fn contains(&self, claimed: &str) -> bool {
        self.origins.iter().any(|o| o.as_str() == claimed)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Origin> {
        self.origins.iter()
    }
}
