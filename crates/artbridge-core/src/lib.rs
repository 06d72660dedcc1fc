// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! artbridge-core: object identity and deferred commits for a handle-based
//! host API.
//!
//! Native objects are known by transient integer handles. This crate gives
//! each one a single long-lived wrapper ([`Item`]), caches native state in
//! version-stamped views ([`CachedView`]), and defers writes into a dirty set
//! that is flushed in batched commit cycles ([`Runtime::commit_all`]).
//!
//! # Scheduling contract
//!
//! The core never decides when to flush. Callers must run
//! [`Runtime::commit_all`]:
//! - before any native read that has to observe pending writes, and
//! - at the end of each externally triggered script invocation.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod commit;
mod error;
mod ident;
mod item;
/// Host type tags and the wrapper kind table.
pub mod kind;
mod port;
mod registry;
mod runtime;
mod settings;
mod value;
mod version;
mod view;

// Re-exports for stable public API
/// Dirty set and commit cycle.
pub use commit::{CommitManager, CommitReport, Commitable};
/// Error taxonomy.
pub use error::{BridgeError, NativeError};
/// Identifier newtypes.
pub use ident::{CommitKey, Handle, NativeRef};
/// Wrapper types.
pub use item::{Document, Item, ItemState};
/// Wrapper kinds dispatched from host type tags.
pub use kind::{ItemKind, TextKind, TypeTag};
/// Host port.
pub use port::NativeHost;
/// Identity registry.
pub use registry::{IdentityRegistry, Retention};
/// Runtime context.
pub use runtime::Runtime;
/// Runtime settings.
pub use settings::RuntimeSettings;
/// Values crossing the native boundary.
pub use value::{CommitBatch, Section, StateRecord, Value};
/// Version clock.
pub use version::{Version, VersionClock};
/// Versioned cached views.
pub use view::CachedView;
