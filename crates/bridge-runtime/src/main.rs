//! # Studio Bridge Runtime
//!
//! Runs one complete editing handshake between a host and its embedded
//! live preview, then prints the exported metrics.
//!
//! ## Startup Sequence
//!
//! 1. Load telemetry configuration and initialize logging/metrics
//! 2. Load bridge configuration (origins)
//! 3. Build the container: contexts, allowlists, targets, open buses
//! 4. Install handshake wiring
//! 5. Drive the handshake to completion
//! 6. Close both buses

use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_bus::{MessageBus, Role};
use bridge_runtime::{BridgeConfig, BridgeContainer, HandshakeCoordinator, PrometheusRecorder};
use bridge_telemetry::{init_telemetry, log_handshake, TelemetryConfig};
use serde_json::json;
use tracing::{info, warn};

/// The runtime orchestrating one editing session.
struct BridgeRuntime {
    container: BridgeContainer,
    coordinator: HandshakeCoordinator,
}

impl BridgeRuntime {
    fn new(config: BridgeConfig) -> Result<Self> {
        let container = BridgeContainer::new(
            config,
            Arc::new(PrometheusRecorder::new(Role::Host)),
            Arc::new(PrometheusRecorder::new(Role::Guest)),
        )
        .context("Failed to open bridge buses")?;
        let coordinator = HandshakeCoordinator::install(&container.host, &container.guest);

        Ok(Self {
            container,
            coordinator,
        })
    }

    /// Drive check-in, reload, navigation and end of editing.
    fn run(&self, navigate_to: &str) {
        info!("===========================================");
        info!("  Studio Bridge Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let c = &self.container;

        let delivered = c.guest.check_in(json!({ "url": "/" }));
        log_handshake!(info, "preview", "Check-in sent", "check-in", delivered);
        c.settle();

        if !c.guest.is_ice_active() {
            warn!("Preview did not enter in-context editing after check-in");
        }

        let delivered = c.host.request_reload();
        log_handshake!(info, "host", "Reload requested", "reload-request", delivered);

        let delivered = c.host.request_navigation(navigate_to);
        log_handshake!(info, "host", "Navigation requested", "nav-request", delivered, url = navigate_to);
        c.settle();

        let delivered = c.host.end_ice(json!(null));
        log_handshake!(info, "host", "Editing ended", "end-ice", delivered);
        c.settle();

        let activity = self.coordinator.activity();
        info!(
            check_ins = c.host.guest_check_ins(),
            reloads = activity.reloads(),
            navigations = ?activity.navigations(),
            ice_active = c.guest.is_ice_active(),
            host_subscriptions = c.host.subscription_count(),
            guest_subscriptions = c.guest.subscription_count(),
            "Handshake complete"
        );
    }

    fn shutdown(&self) {
        self.coordinator.uninstall();
        self.container.host.close();
        self.container.guest.close();
        info!("Shutdown complete");
    }
}

fn main() -> Result<()> {
    let telemetry_config = TelemetryConfig::from_env();
    let telemetry = init_telemetry(&telemetry_config).context("Failed to initialize telemetry")?;

    let config = BridgeConfig::from_env().context("Invalid bridge configuration")?;

    let runtime = BridgeRuntime::new(config)?;
    runtime.run("/preview");
    runtime.shutdown();

    if let Some(metrics) = telemetry.metrics() {
        let text = metrics.render().context("Failed to render metrics")?;
        println!("{text}");
    }

    Ok(())
}
