//! # Adapter Implementations
//!
//! Concrete implementations of the bus's outbound hooks.

pub mod metrics;

pub use metrics::PrometheusRecorder;
