//! Prometheus adapter for bus metrics.
//!
//! Forwards the traffic counters `bridge-telemetry` exports, labelled by bus
//! role. Dispatch-level events stay on the in-process `BusMetrics`.

use bridge_bus::{MetricsRecorder, Role};
use bridge_telemetry::{
    MESSAGES_DELIVERED, MESSAGES_PUBLISHED, MESSAGES_RECEIVED, ORIGIN_REJECTIONS, TARGETS_EVICTED,
};
use tracing::trace;

/// `MetricsRecorder` backed by the global Prometheus counters.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusRecorder {
    role: &'static str,
}

impl PrometheusRecorder {
    pub fn new(role: Role) -> Self {
        let role = match role {
            Role::Host => "host",
            Role::Guest => "guest",
        };
        Self { role }
    }
}

impl MetricsRecorder for PrometheusRecorder {
    fn record_published(&self, _targets: usize) {
        MESSAGES_PUBLISHED.with_label_values(&[self.role]).inc();
    }

    fn record_delivered(&self) {
        MESSAGES_DELIVERED.with_label_values(&[self.role]).inc();
    }

    fn record_target_evicted(&self) {
        TARGETS_EVICTED.with_label_values(&[self.role]).inc();
    }

    fn record_received(&self) {
        MESSAGES_RECEIVED.with_label_values(&[self.role]).inc();
    }

    fn record_origin_rejected(&self) {
        ORIGIN_REJECTIONS.with_label_values(&[self.role]).inc();
    }

    fn record_dispatched(&self, handlers: usize) {
        trace!(role = self.role, handlers, "Dispatched");
    }

    fn record_unmatched(&self) {
        trace!(role = self.role, "Unmatched");
    }

    fn record_relay_dropped(&self) {
        trace!(role = self.role, "Relay dropped");
    }
}
