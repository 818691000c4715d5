//! # Origins
//!
//! The security identity of a context: `scheme://host[:port]`.
//!
//! Two constructors exist on purpose. `Origin::parse` is for origins the
//! application *configures* (allowlist entries) and normalises them.
//! `Origin::from_raw` is for origins the environment *claims* for an inbound
//! message and keeps the string exactly as reported, so that membership is a
//! plain string comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TypeError;

/// A context's security identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    /// Parse and normalise a configured origin.
    ///
    /// Scheme and host are lowercased and the default port of `http` (80) or
    /// `https` (443) is dropped, since the environment never reports it.
    /// Paths, queries, fragments, credentials, whitespace and control
    /// characters are rejected, as is a non-numeric port.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOrigin` describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let invalid = |reason| TypeError::InvalidOrigin {
            origin: input.to_string(),
            reason,
        };

        if input.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("origin contains whitespace or control characters"));
        }

        let (scheme, rest) = input.split_once("://").ok_or_else(|| invalid("missing ://"))?;

        let scheme = scheme.to_ascii_lowercase();
        let mut chars = scheme.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return Err(invalid("scheme must start with a letter")),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
            return Err(invalid("scheme contains invalid characters"));
        }

        if rest.contains(['/', '?', '#', '@']) {
            return Err(invalid("origin must not carry a path, query, fragment or credentials"));
        }

        let (host, port) = split_host_port(rest).ok_or_else(|| invalid("malformed host"))?;
        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        if !host.starts_with('[') && host.contains(':') {
            return Err(invalid("host contains ':' outside brackets"));
        }
        let port = match port {
            Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                Some(digits.parse::<u16>().map_err(|_| invalid("port is not a number in 0..=65535"))?)
            }
            Some(_) => return Err(invalid("port is not a number in 0..=65535")),
            None => None,
        };
        let port = port.filter(|&port| !is_default_port(&scheme, port));

        let host = host.to_ascii_lowercase();
        Ok(match port {
            Some(port) => Self(format!("{scheme}://{host}:{port}")),
            None => Self(format!("{scheme}://{host}")),
        })
    }

    /// Wrap a claimed origin without validation.
    #[must_use]
    pub fn from_raw(claimed: impl Into<String>) -> Self {
        Self(claimed.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}

/// Split `host[:port]`, handling bracketed IPv6 literals.
fn split_host_port(authority: &str) -> Option<(&str, Option<&str>)> {
    if let Some(stripped) = authority.strip_prefix('[') {
        let end = stripped.find(']')?;
        let host = &authority[..end + 2];
        return match &stripped[end + 1..] {
            "" => Some((host, None)),
            tail => tail.strip_prefix(':').map(|port| (host, Some(port))),
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host, Some(port))),
        None => Some((authority, None)),
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Origin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
