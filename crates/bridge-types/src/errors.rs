//! # Error Types
//!
//! Errors raised while building or decoding wire values.

use thiserror::Error;

/// Errors from constructing typed values out of untrusted strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The origin string is not of the form `scheme://host[:port]`.
    #[error("Invalid origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: &'static str },

    /// The topic name is not part of the handshake vocabulary.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
}

/// Errors from decoding an inbound wire message into an envelope.
///
/// These never reach a publisher or subscriber. The bus logs them and drops
/// the message as unmatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The message is not a JSON object.
    #[error("Message is not an object")]
    NotAnObject,

    /// The `topic` field is absent or not a string.
    #[error("Message has no topic")]
    MissingTopic,

    /// The `topic` field names no known topic.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
}
