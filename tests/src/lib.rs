//! # CS Test Suite
//!
//! Unified test crate for flows that cross module boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # End-to-end flows through the message dispatcher
//!     ├── fixtures.rs   # Simulated platform shared by every flow
//!     ├── monitoring.rs # Background scanning and miscompare detection
//!     ├── tables.rs     # Definition table loads and updates
//!     ├── persistence.rs# Resource states across resets
//!     └── child_tasks.rs# Recompute and one-shot on the tokio runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cs-tests
//!
//! # Benchmarks
//! cargo bench -p cs-tests
//! ```

pub mod integration;
