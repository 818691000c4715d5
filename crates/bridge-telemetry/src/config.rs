//! Telemetry configuration from environment variables.

use std::env;

use serde::Serialize;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output (for development)
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether bus counters are exported to Prometheus
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "studio-bridge".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SB_SERVICE_NAME`: Service name (default: studio-bridge)
    /// - `SB_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SB_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `SB_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `SB_METRICS_ENABLED`: Export Prometheus counters (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("SB_SERVICE_NAME")
                .unwrap_or_else(|_| "studio-bridge".to_string()),

            log_level: env::var("SB_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("SB_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("SB_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            metrics_enabled: env::var("SB_METRICS_ENABLED")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),
        }
    }
}

/// `true`/`1` and `false`/`0`, case-insensitive. Anything else is `default`.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => default,
    }
}
