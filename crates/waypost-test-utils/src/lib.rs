#![deny(unsafe_code)]

//! Shared test utilities for the Waypost workspace.
//!
//! Provides reusable fixtures, config builders, and tracing helpers so that
//! individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! waypost-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod consumer;
pub mod socket;
pub mod tracing_setup;
