//! # Bridge Types Crate
//!
//! Wire vocabulary for the cross-context message bridge. Every context that
//! takes part in the bridge (the host application and any embedded guest such
//! as a live preview pane) links this crate so both sides agree on topics,
//! scopes and the envelope layout.
//!
//! ## Design Principles
//!
//! - **Opaque payloads**: `Envelope::data` is never inspected by the bus.
//! - **Closed topic set**: handshake topics are an enum, with one wildcard.
//! - **Claimed origins are not trusted**: `Origin::from_raw` wraps whatever the
//!   environment reports; only allowlist membership grants trust.

pub mod envelope;
pub mod errors;
pub mod origin;

pub use envelope::{Envelope, Scope, Topic};
pub use errors::{TypeError, WireError};
pub use origin::Origin;
