// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tracing subscriber for tests.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber writing through the libtest capture.
///
/// Honors `RUST_LOG`; safe to call from every test (later calls are no-ops).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
