//! # Bridge Bus - Cross-Context Message Bus
//!
//! Coordinates a host application with one or more embedded guest contexts
//! (for example a live preview pane) over an asynchronous channel supplied by
//! the hosting environment.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   publish()                 ┌──────────────┐
//! │   HostBus    │ ──── Envelope ────────────▶ │   GuestBus   │
//! │              │   (per live target)         │              │
//! │              │                             │ inbound gate │
//! │              │                             │  └ allowlist │
//! │              │ ◀─────────── Envelope ───── │  └ dispatch  │
//! └──────────────┘                 publish()   └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - **Origin is the only authentication.** An inbound message whose claimed
//!   origin is not allowlisted is dropped before any subscriber sees it.
//! - **No self-echo.** `publish` only sends outward. Local subscribers run
//!   only when the environment delivers an inbound message.
//! - **Lazy pruning.** A target that no longer resolves to a delivery handle
//!   is evicted the next time something is published.
//! - **Scope is advisory.** The bus records it; `Relay` enforces it.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod error;
pub mod guest;
pub mod host;
pub mod memory;
pub mod metrics;
pub mod origins;
pub mod relay;
pub mod subscriptions;
pub mod targets;

// Re-export main types
pub use bridge_types::{Envelope, Origin, Scope, Topic};
pub use bus::{Channel, InboundListener, InboundMessage, ListenerId, MessageBus, MessageSource, Role};
pub use error::BusError;
pub use guest::GuestBus;
pub use host::HostBus;
pub use memory::{ContextHandle, ContextId, DeliveryRecord, EmbeddedFrame, FrameId, FrameRef, InMemoryEnvironment, WindowRef};
pub use metrics::{BusMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use origins::OriginAllowlist;
pub use relay::Relay;
pub use subscriptions::{EnvelopeHandler, SubscriptionId, SubscriptionTable, SubscriptionToken};
pub use targets::{DeliveryHandle, Target, TargetKey, TargetRegistry};
