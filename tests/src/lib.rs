//! # Chain Hub Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Two-hub fixture over in-memory ledgers
//! └── integration/      # Cross-crate relay scenarios
//!     ├── relay_flows.rs
//!     ├── timeout_retry.rs
//!     ├── cursor_resume.rs
//!     └── http_hubs.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ch-tests
//! cargo test -p ch-tests integration::http_hubs
//! ```

pub mod harness;
pub mod integration;
