//! # Message Envelope
//!
//! The wrapper every message travels in between contexts.
//!
//! ## Wire Format
//!
//! ```text
//! { "topic": "start-ice", "data": <any JSON>, "scope": "external" }
//! ```
//!
//! - `topic` selects the subscribers on the receiving side.
//! - `data` is opaque to the bus and handed to subscribers verbatim.
//! - `scope` declares how far the publisher wants the message to travel.
//!   Only relays act on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{TypeError, WireError};

/// Topics understood by the host/guest handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Wildcard. Subscribers receive every message.
    #[serde(rename = "*")]
    All,
    /// A guest announces it has loaded and is ready to talk.
    #[serde(rename = "check-in")]
    GuestCheckIn,
    /// Host asks the guest to enter in-context editing (ICE) mode.
    #[serde(rename = "start-ice")]
    StartIce,
    /// Host asks the guest to leave ICE mode.
    #[serde(rename = "end-ice")]
    EndIce,
    /// Host asks the guest to reload its content.
    #[serde(rename = "reload-request")]
    GuestReloadRequest,
    /// Host asks the guest to navigate elsewhere.
    #[serde(rename = "nav-request")]
    GuestNavRequest,
}

impl Topic {
    /// Wire name of the topic.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "*",
            Self::GuestCheckIn => "check-in",
            Self::StartIce => "start-ice",
            Self::EndIce => "end-ice",
            Self::GuestReloadRequest => "reload-request",
            Self::GuestNavRequest => "nav-request",
        }
    }

    /// True for the wildcard topic.
    #[must_use]
    pub fn is_wildcard(self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(Self::All),
            "check-in" => Ok(Self::GuestCheckIn),
            "start-ice" => Ok(Self::StartIce),
            "end-ice" => Ok(Self::EndIce),
            "reload-request" => Ok(Self::GuestReloadRequest),
            "nav-request" => Ok(Self::GuestNavRequest),
            other => Err(TypeError::UnknownTopic(other.to_string())),
        }
    }
}

/// Declared reach of a message.
///
/// The bus records the scope but never acts on it. Components that both
/// receive and forward messages are expected to honour it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Same-context consumption only. Never forwarded by a relay.
    Local,
    /// Crosses exactly one boundary. Never forwarded by a relay.
    External,
    /// May be relayed across any number of hops.
    #[default]
    Broadcast,
}

impl Scope {
    /// Wire name of the scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::External => "external",
            Self::Broadcast => "broadcast",
        }
    }

    /// Whether a relay that received a message with this scope may forward it.
    #[must_use]
    pub fn is_relayable(self) -> bool {
        matches!(self, Self::Broadcast)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable message in flight.
///
/// Built once by `publish`, handed to every target, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    topic: Topic,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    scope: Scope,
}

impl Envelope {
    /// Create a broadcast envelope.
    #[must_use]
    pub fn new(topic: Topic, data: Value) -> Self {
        Self::with_scope(topic, data, Scope::Broadcast)
    }

    /// Create an envelope with an explicit scope.
    #[must_use]
    pub fn with_scope(topic: Topic, data: Value, scope: Scope) -> Self {
        Self { topic, data, scope }
    }

    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Render the envelope as the JSON object handed to the delivery primitive.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        json!({
            "topic": self.topic.as_str(),
            "data": self.data,
            "scope": self.scope.as_str(),
        })
    }

    /// Decode an inbound wire message.
    ///
    /// Only the topic is required. A missing `data` becomes `null` and a
    /// missing or unrecognised `scope` becomes `Broadcast`. The payload itself
    /// is passed through untouched.
    ///
    /// # Errors
    ///
    /// - `WireError::NotAnObject` - the message is not a JSON object
    /// - `WireError::MissingTopic` - no string `topic` field
    /// - `WireError::UnknownTopic` - `topic` names no known topic
    pub fn from_wire(message: &Value) -> Result<Self, WireError> {
        let object = message.as_object().ok_or(WireError::NotAnObject)?;

        let name = object
            .get("topic")
            .and_then(Value::as_str)
            .ok_or(WireError::MissingTopic)?;
        let topic = name
            .parse::<Topic>()
            .map_err(|_| WireError::UnknownTopic(name.to_string()))?;

        let data = object.get("data").cloned().unwrap_or(Value::Null);
        let scope = object
            .get("scope")
            .and_then(|s| Scope::deserialize(s).ok())
            .unwrap_or_default();

        Ok(Self { topic, data, scope })
    }
}
