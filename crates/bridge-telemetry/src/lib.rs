//! # Bridge Telemetry
//!
//! Observability for Studio Bridge processes.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events through a `tracing-subscriber` registry,
//!   pretty in development and JSON in containers
//! - **Metrics**: Prometheus counters for bus traffic, rendered in text format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let telemetry = init_telemetry(&config).expect("Failed to init telemetry");
//!
//!     // Your application code here
//!
//!     if let Some(metrics) = telemetry.metrics() {
//!         println!("{}", metrics.render().unwrap_or_default());
//!     }
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SB_SERVICE_NAME` | `studio-bridge` | Service name in logs |
//! | `SB_LOG_LEVEL` | `info` | Log level filter |
//! | `SB_JSON_LOGS` | `false` | JSON log lines |
//! | `SB_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SB_METRICS_ENABLED` | `true` | Register Prometheus counters |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    register_metrics, MetricsHandle, MESSAGES_DELIVERED, MESSAGES_PUBLISHED,
    MESSAGES_RECEIVED, ORIGIN_REJECTIONS, TARGETS_EVICTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and, if enabled, metrics.
///
/// # Errors
///
/// Propagates `init_logging` and `register_metrics` failures.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    // Initialize metrics first so nothing logged during startup is uncounted
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    init_logging(config)?;

    if let Ok(effective) = serde_json::to_string(config) {
        tracing::debug!(config = %effective, "Telemetry configuration");
    }

    Ok(Telemetry { metrics })
}

/// Handle returned by `init_telemetry`.
#[derive(Debug)]
pub struct Telemetry {
    metrics: Option<MetricsHandle>,
}

impl Telemetry {
    pub fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics.as_ref()
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}
