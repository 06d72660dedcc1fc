// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for ArtBridge crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`host`] - Scriptable fake of the native host with call counters
//! - [`commitable`] - Counting `Commitable` for commit-cycle assertions
//! - [`logging`] - Test-writer tracing subscriber
#![forbid(unsafe_code)]

pub mod commitable;
pub mod config;
pub mod host;
pub mod logging;

// Re-export commonly used items at crate root for convenience
pub use commitable::CountingCommitable;
pub use config::InMemoryConfigStore;
pub use host::{FakeNativeHost, FakeObject};
pub use logging::init_test_tracing;
