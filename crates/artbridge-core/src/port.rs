// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Native host port trait.

use crate::error::NativeError;
use crate::ident::{Handle, NativeRef};
use crate::kind::TypeTag;
use crate::value::{CommitBatch, Section, StateRecord};

/// Host application port.
///
/// The core never talks to the host application directly; adapters (the
/// plugin glue, or a fake in tests) implement this trait. Every call is
/// synchronous and may be slow: it crosses into the host.
///
/// # Design
///
/// This trait is a hexagonal port. The core decides *when* native state is
/// read or written (version checks, commit cycles); adapters decide *how*.
/// Methods take `&self` because all calls are serialized onto the single
/// scripting thread; adapters needing mutation use interior mutability.
pub trait NativeHost {
    /// Create a new native object of type `tag` inside `document`.
    fn create_object(&self, document: Handle, tag: TypeTag) -> Result<Handle, NativeError>;

    /// Delete the object. Returns `false` when the host declined.
    fn delete_object(&self, target: NativeRef) -> Result<bool, NativeError>;

    /// Read the current native state of one section.
    fn fetch_state(&self, target: NativeRef, section: Section) -> Result<StateRecord, NativeError>;

    /// Write a batch of sections in one call.
    fn commit_state(&self, batch: &CommitBatch) -> Result<(), NativeError>;
}
