//! # Bridge Runtime Library
//!
//! This library exposes the internal modules of the bridge runtime for
//! testing. The main entry point is the `main.rs` binary.
//!
//! ## Layout
//!
//! - `container/` - Configuration and the wired pair of buses
//! - `adapters/` - Prometheus implementation of the bus metrics hook
//! - `wiring/` - Handshake subscriptions on both sides

pub mod adapters;
pub mod container;
pub mod wiring;

pub use adapters::PrometheusRecorder;
pub use container::{BridgeConfig, BridgeContainer, ConfigError};
pub use wiring::{HandshakeCoordinator, PreviewActivity};
