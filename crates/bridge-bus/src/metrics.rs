//! Metrics hooks for bus traffic
//!
//! Every bus reports to an `Arc<dyn MetricsRecorder>`. `BusMetrics` keeps
//! in-process counters; exporters (Prometheus in `bridge-runtime`) implement
//! the trait themselves.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_bus::{BusMetrics, HostBus};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(BusMetrics::new());
//! let host = HostBus::with_metrics(metrics.clone());
//! // ...
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Observer for bus traffic.
pub trait MetricsRecorder: Send + Sync {
    /// An envelope was handed to the publish loop.
    fn record_published(&self, targets: usize);
    /// An envelope was handed to one resolved delivery handle.
    fn record_delivered(&self);
    /// A target failed to resolve and was evicted.
    fn record_target_evicted(&self);
    /// An inbound message reached the gate.
    fn record_received(&self);
    /// An inbound message was dropped because its origin is not allowlisted.
    fn record_origin_rejected(&self);
    /// An authenticated envelope was dispatched to `handlers` subscribers.
    fn record_dispatched(&self, handlers: usize);
    /// An authenticated message matched no subscriber or could not be decoded.
    fn record_unmatched(&self);
    /// A relay declined to forward an envelope because of its scope.
    fn record_relay_dropped(&self);
}

/// In-process counters.
#[derive(Debug, Default)]
pub struct BusMetrics {
    pub published: AtomicU64,
    pub delivered: AtomicU64,
    pub targets_evicted: AtomicU64,
    pub received: AtomicU64,
    pub origin_rejected: AtomicU64,
    pub dispatched: AtomicU64,
    pub handler_invocations: AtomicU64,
    pub unmatched: AtomicU64,
    pub relay_dropped: AtomicU64,
}

/// Point-in-time copy of `BusMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub published: u64,
    pub delivered: u64,
    pub targets_evicted: u64,
    pub received: u64,
    pub origin_rejected: u64,
    pub dispatched: u64,
    pub handler_invocations: u64,
    pub unmatched: u64,
    pub relay_dropped: u64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            targets_evicted: self.targets_evicted.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            origin_rejected: self.origin_rejected.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            handler_invocations: self.handler_invocations.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            relay_dropped: self.relay_dropped.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.published,
            &self.delivered,
            &self.targets_evicted,
            &self.received,
            &self.origin_rejected,
            &self.dispatched,
            &self.handler_invocations,
            &self.unmatched,
            &self.relay_dropped,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl MetricsRecorder for BusMetrics {
    fn record_published(&self, _targets: usize) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    fn record_target_evicted(&self) {
        self.targets_evicted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_origin_rejected(&self) {
        self.origin_rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dispatched(&self, handlers: usize) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        self.handler_invocations
            .fetch_add(handlers as u64, Ordering::Relaxed);
    }

    fn record_unmatched(&self) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);
    }

    fn record_relay_dropped(&self) {
        self.relay_dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Recorder that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_published(&self, _: usize) {}
    fn record_delivered(&self) {}
    fn record_target_evicted(&self) {}
    fn record_received(&self) {}
    fn record_origin_rejected(&self) {}
    fn record_dispatched(&self, _: usize) {}
    fn record_unmatched(&self) {}
    fn record_relay_dropped(&self) {}
}
