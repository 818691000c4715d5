//! Prometheus metrics for the bridge.
//!
//! All metrics follow the naming convention: `bridge_<what>_total`, labelled
//! by bus `role` (host, guest).

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Envelopes handed to `publish`
    pub static ref MESSAGES_PUBLISHED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_messages_published_total", "Total envelopes published"),
        &["role"]
    ).expect("metric creation failed");

    /// Per-target deliveries
    pub static ref MESSAGES_DELIVERED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_messages_delivered_total", "Total envelopes posted to a live target"),
        &["role"]
    ).expect("metric creation failed");

    /// Inbound messages seen by the gate, before authentication
    pub static ref MESSAGES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_messages_received_total", "Total inbound messages received"),
        &["role"]
    ).expect("metric creation failed");

    /// Inbound messages dropped for a disallowed origin
    pub static ref ORIGIN_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_origin_rejections_total", "Total inbound messages from disallowed origins"),
        &["role"]
    ).expect("metric creation failed");

    /// Targets pruned at send time
    pub static ref TARGETS_EVICTED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_targets_evicted_total", "Total unreachable targets evicted"),
        &["role"]
    ).expect("metric creation failed");
}

/// Keeps the registry reachable for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Render every registered metric in Prometheus text format.
    pub fn render(&self) -> Result<String, TelemetryError> {
        encode(&self.registry)
    }
}

/// Register all bridge metrics with the global registry.
///
/// # Errors
///
/// `TelemetryError::MetricsInit` if a metric is already registered.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_PUBLISHED.clone()),
        Box::new(MESSAGES_DELIVERED.clone()),
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(ORIGIN_REJECTIONS.clone()),
        Box::new(TARGETS_EVICTED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

fn encode(registry: &Registry) -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
