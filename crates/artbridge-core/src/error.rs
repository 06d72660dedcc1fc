// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Error taxonomy surfaced to the scripting layer.

use thiserror::Error;

use crate::ident::{CommitKey, Handle};

/// Failure reported by a [`crate::NativeHost`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// The host does not know the object (deleted behind our back).
    #[error("native object {0} not found")]
    NotFound(Handle),
    /// The host rejected the call.
    #[error("native call rejected: {0}")]
    Rejected(String),
}

/// Errors raised by the identity, versioning and commit layer.
///
/// All variants are ordinary script-visible errors; none of them leave the
/// registry, dirty set or clock in a partially updated state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Operation attempted on a wrapper whose object was removed.
    #[error("object is deleted")]
    StaleHandle,
    /// The host reported a type tag with no wrapper constructor.
    #[error("unrecognized item type (art type {art_type}, text type {text_type})")]
    UnrecognizedType {
        /// Art type tag as reported by the host.
        art_type: i16,
        /// Text sub-type tag as reported by the host.
        text_type: i16,
    },
    /// A registered wrapper already claims a handle that the host reported
    /// without confirming it is the same object.
    #[error("handle {handle} collides with a wrapper for a different object")]
    IdentityConflict {
        /// The colliding handle.
        handle: Handle,
    },
    /// Flushing one commit key to the host failed; it will be retried.
    #[error("commit of {key} failed: {source}")]
    CommitFailed {
        /// The key whose flush failed.
        key: CommitKey,
        /// Underlying cause.
        #[source]
        source: Box<BridgeError>,
    },
    /// A commit key failed on every attempt and its pending edits were dropped.
    #[error("commit of {key} abandoned after {attempts} attempts: {source}")]
    CommitAbandoned {
        /// The key whose edits were dropped.
        key: CommitKey,
        /// Number of failed attempts.
        attempts: u32,
        /// Cause of the last failure.
        #[source]
        source: Box<BridgeError>,
    },
    /// Error from the host adapter.
    #[error(transparent)]
    Native(#[from] NativeError),
}
