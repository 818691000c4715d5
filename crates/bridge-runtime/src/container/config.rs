//! # Bridge Configuration
//!
//! Origins of the two peers and any extra trusted origins.
//!
//! ## Security Requirements
//!
//! - Every configured origin MUST parse as `scheme://host[:port]`
//! - The host and preview origins are always trusted by their peer

use std::env;

use bridge_types::{Origin, TypeError};
use thiserror::Error;

pub const DEFAULT_HOST_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_PREVIEW_ORIGIN: &str = "http://localhost:3000";

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Origin of the editing application.
    pub host_origin: Origin,
    /// Origin of the embedded live preview.
    pub preview_origin: Origin,
    /// Extra origins trusted by both sides.
    pub allowed_origins: Vec<Origin>,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid origin: {source}")]
    InvalidOrigin {
        var: &'static str,
        #[source]
        source: TypeError,
    },
}

impl BridgeConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SB_HOST_ORIGIN`: Host origin (default: http://localhost:8080)
    /// - `SB_PREVIEW_ORIGIN`: Preview origin (default: http://localhost:3000)
    /// - `SB_ALLOWED_ORIGINS`: Comma-separated extra origins (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host_origin = parse_var(
            "SB_HOST_ORIGIN",
            &lookup("SB_HOST_ORIGIN").unwrap_or_else(|| DEFAULT_HOST_ORIGIN.to_string()),
        )?;
        let preview_origin = parse_var(
            "SB_PREVIEW_ORIGIN",
            &lookup("SB_PREVIEW_ORIGIN").unwrap_or_else(|| DEFAULT_PREVIEW_ORIGIN.to_string()),
        )?;

        let allowed_origins = lookup("SB_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_var("SB_ALLOWED_ORIGINS", s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            host_origin,
            preview_origin,
            allowed_origins,
        })
    }

    /// Origins the host bus accepts messages from.
    pub fn host_allowlist(&self) -> Vec<Origin> {
        std::iter::once(self.preview_origin.clone())
            .chain(self.allowed_origins.iter().cloned())
            .collect()
    }

    /// Origins the guest bus accepts messages from.
    pub fn guest_allowlist(&self) -> Vec<Origin> {
        std::iter::once(self.host_origin.clone())
            .chain(self.allowed_origins.iter().cloned())
            .collect()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host_origin: Origin::from_raw(DEFAULT_HOST_ORIGIN),
            preview_origin: Origin::from_raw(DEFAULT_PREVIEW_ORIGIN),
            allowed_origins: Vec::new(),
        }
    }
}

fn parse_var(var: &'static str, value: &str) -> Result<Origin, ConfigError> {
    Origin::parse(value).map_err(|source| ConfigError::InvalidOrigin { var, source })
}
