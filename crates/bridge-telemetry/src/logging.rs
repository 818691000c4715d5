//! Structured logging.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! pretty console layer (development) or a JSON layer (containers). JSON lines
//! carry consistent fields:
//! - `timestamp`: ISO 8601 timestamp
//! - `level`: Log level (trace, debug, info, warn, error)
//! - `target`: Emitting module
//! - `fields.component`: Component tag when logged through `log_event!`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// # Errors
///
/// `TelemetryError::LoggingInit` if the filter is invalid or a global
/// subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
        return Ok(());
    }

    if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        level = %config.log_level,
        "Logging initialized"
    );
    Ok(())
}

/// Helper to create structured log entries with a component tag.
#[macro_export]
macro_rules! log_event {
    // Info level with component
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
    // Warn level with component
    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
    // Error level with component
    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
    // Debug level with component
    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a handshake step between two contexts with standard fields.
#[macro_export]
macro_rules! log_handshake {
    ($level:ident, $component:expr, $msg:expr, $topic:expr, $delivered:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            topic = %$topic,
            delivered = $delivered,
            $($($field)*,)?
            $msg
        )
    };
}
