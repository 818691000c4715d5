//! Shared fixtures for integration tests.

use std::sync::Arc;

use bridge_bus::{
    BusMetrics, ContextHandle, EmbeddedFrame, GuestBus, HostBus, InMemoryEnvironment, MessageBus,
    Origin,
};
use parking_lot::Mutex;
use serde_json::Value;

pub const HOST: &str = "https://host.example";
pub const PREVIEW: &str = "https://preview.example";
pub const EVIL: &str = "https://evil.example";

pub fn origin(s: &str) -> Origin {
    Origin::parse(s).expect("fixture origin must parse")
}

/// A host context embedding one preview frame, with a bus open on each side.
pub struct Session {
    pub env: InMemoryEnvironment,
    pub host_ctx: ContextHandle,
    pub frame: EmbeddedFrame,
    pub host: Arc<HostBus>,
    pub guest: Arc<GuestBus>,
    pub host_metrics: Arc<BusMetrics>,
    pub guest_metrics: Arc<BusMetrics>,
}

impl Session {
    pub fn new() -> Self {
        let env = InMemoryEnvironment::new();
        let host_ctx = env.open_context(origin(HOST));
        let frame = env.embed_frame(&host_ctx, origin(PREVIEW));

        let host_metrics = Arc::new(BusMetrics::new());
        let host = Arc::new(HostBus::with_metrics(host_metrics.clone()));
        host.add_origin(origin(PREVIEW));
        host.add_target(Arc::new(host_ctx.frame_ref(&frame)));
        host.open(Arc::new(host_ctx.clone())).expect("fresh host bus opens");

        let guest_metrics = Arc::new(BusMetrics::new());
        let guest = Arc::new(GuestBus::with_metrics(guest_metrics.clone()));
        guest.add_origin(origin(HOST));
        guest.add_target(Arc::new(frame.parent_window()));
        guest.open(Arc::new(frame.content.clone())).expect("fresh guest bus opens");

        Self {
            env,
            host_ctx,
            frame,
            host,
            guest,
            host_metrics,
            guest_metrics,
        }
    }

    pub fn guest_ctx(&self) -> &ContextHandle {
        &self.frame.content
    }

    pub fn settle(&self) -> usize {
        self.env.run_until_idle()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the data of every envelope a handler sees.
#[derive(Clone, Default)]
pub struct Seen(Arc<Mutex<Vec<Value>>>);

impl Seen {
    pub fn handler(&self) -> impl Fn(&Value) + Send + Sync + 'static {
        let sink = self.0.clone();
        move |data: &Value| sink.lock().push(data.clone())
    }

    pub fn count(&self) -> usize {
        self.0.lock().len()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.lock().clone()
    }
}
