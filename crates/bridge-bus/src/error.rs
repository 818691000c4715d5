//! Error types for the bus.
//!
//! Only lifecycle operations can fail. `publish` and `subscribe` contain
//! every failure mode internally.

use thiserror::Error;

use crate::bus::Role;

/// Errors from bus lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// `open` was called while an inbound hook is already installed.
    #[error("{role} bus is already open")]
    AlreadyOpen { role: Role },
}
