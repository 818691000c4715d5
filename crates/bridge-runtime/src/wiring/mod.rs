//! # Handshake Wiring
//!
//! Subscriptions that turn the two buses into an editing session.
//!
//! ```text
//! preview ──check-in──────▶ host
//! preview ◀──start-ice───── host   (automatic, on every check-in)
//! preview ◀──reload-request host
//! preview ◀──nav-request─── host
//! preview ◀──end-ice─────── host
//! ```

pub mod handshake;

pub use handshake::{HandshakeCoordinator, PreviewActivity};
