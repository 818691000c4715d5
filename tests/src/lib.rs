//! # Studio Bridge Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks for the bus hot paths
//! └── src/
//!     └── integration/  # Cross-crate behaviour over the in-memory environment
//!         ├── properties.rs   # Registry, gate, dispatch and echo rules
//!         ├── scenarios.rs    # Numbered end-to-end scenarios
//!         └── handshake.rs    # Full host/preview session, relays, frames
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p bridge-tests
//!
//! # By category
//! cargo test -p bridge-tests integration::scenarios::
//!
//! # Benchmarks
//! cargo bench -p bridge-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]
