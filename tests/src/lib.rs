//! # Cell Host Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs        # Device lifecycle driven through the in-memory adapters
//!     ├── sync.rs         # Host to observer broadcast over the wire format
//!     └── properties.rs   # Property tests over whole-device behaviour
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cell-host-tests
//!
//! # By category
//! cargo test -p cell-host-tests integration::flows
//! cargo test -p cell-host-tests integration::properties
//!
//! # Benchmarks
//! cargo bench -p cell-host-tests
//! ```

#![allow(dead_code)]

pub mod integration;
