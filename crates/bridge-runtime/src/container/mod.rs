//! # Bridge Container
//!
//! Holds one host bus and one preview guest bus with their contexts, wired
//! to each other over an `InMemoryEnvironment`.
//!
//! ```text
//! host context ──frame ref──▶ preview context
//!      ▲                            │
//!      └──────── parent window ─────┘
//! ```

pub mod config;

pub use config::{BridgeConfig, ConfigError};

use std::sync::Arc;

use bridge_bus::{
    BusError, ContextHandle, EmbeddedFrame, GuestBus, HostBus, InMemoryEnvironment, MessageBus,
    MetricsRecorder,
};
use tracing::info;

/// Both buses, open and targeting each other.
pub struct BridgeContainer {
    pub config: BridgeConfig,
    pub env: InMemoryEnvironment,
    pub host_ctx: ContextHandle,
    pub frame: EmbeddedFrame,
    pub host: Arc<HostBus>,
    pub guest: Arc<GuestBus>,
}

impl BridgeContainer {
    /// Build the contexts, configure both allowlists and open both buses.
    ///
    /// # Errors
    ///
    /// `BusError::AlreadyOpen` cannot happen for fresh buses but is propagated.
    pub fn new(
        config: BridgeConfig,
        host_metrics: Arc<dyn MetricsRecorder>,
        guest_metrics: Arc<dyn MetricsRecorder>,
    ) -> Result<Self, BusError> {
        let env = InMemoryEnvironment::new();
        let host_ctx = env.open_context(config.host_origin.clone());
        let frame = env.embed_frame(&host_ctx, config.preview_origin.clone());

        let host = Arc::new(HostBus::with_metrics(host_metrics));
        for origin in config.host_allowlist() {
            host.add_origin(origin);
        }
        host.add_target(Arc::new(host_ctx.frame_ref(&frame)));
        host.open(Arc::new(host_ctx.clone()))?;

        let guest = Arc::new(GuestBus::with_metrics(guest_metrics));
        for origin in config.guest_allowlist() {
            guest.add_origin(origin);
        }
        guest.add_target(Arc::new(frame.parent_window()));
        guest.open(Arc::new(frame.content.clone()))?;

        info!(
            host = %config.host_origin,
            preview = %config.preview_origin,
            extra_origins = config.allowed_origins.len(),
            "Bridge container initialized"
        );

        Ok(Self {
            config,
            env,
            host_ctx,
            frame,
            host,
            guest,
        })
    }

    /// Tear the preview down, as when the user closes it.
    pub fn close_preview(&self) {
        self.env.detach_frame(&self.frame);
    }

    /// Deliver everything queued.
    pub fn settle(&self) -> usize {
        self.env.run_until_idle()
    }
}
