// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Handle and key identifier types.

/// Opaque identifier of an object living in the host application's memory.
///
/// A handle is a lookup key, not an identity: the host may hand the same
/// value out again for a different object after the first one is gone, and a
/// single logical object may move to a new handle (type promotion, reload).
/// Identity is carried by the wrapper registered under the handle.
///
/// # Invariants
/// - Zero (`Handle::NULL`) means "no object / destroyed". The host never
///   reports a live object under zero.
///
/// The `#[repr(transparent)]` attribute keeps `Handle` ABI-compatible with
/// `u64` so host adapters can pass it straight through.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Handle(u64);

impl Handle {
    /// Sentinel for "no handle" and for wrappers whose object was deleted.
    pub const NULL: Self = Self(0);

    /// Constructs a `Handle` from a raw host value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns `true` for the [`Handle::NULL`] sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for Handle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "@{:x}", self.0)
    }
}

/// Scope of a native call: the object and the document that owns it.
///
/// Native operations are always addressed through a `NativeRef` so the host
/// adapter can activate the right document before touching the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct NativeRef {
    /// Owning document (may be [`Handle::NULL`] for document-less objects).
    pub document: Handle,
    /// The object itself.
    pub object: Handle,
}

impl NativeRef {
    /// Constructs a reference to `object` inside `document`.
    #[must_use]
    pub const fn new(document: Handle, object: Handle) -> Self {
        Self { document, object }
    }
}

/// Deduplication key for pending commits.
///
/// Every wrapper is allocated a fresh key by the runtime; sub-objects of a
/// wrapper (its cached views) reuse the owner's key so they flush together
/// in a single native call.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct CommitKey(u64);

impl CommitKey {
    /// Constructs a key from a raw value.
    ///
    /// Keys produced by [`crate::Runtime::allocate_commit_key`] are unique per
    /// runtime; hand-built keys are only meaningful in tests or adapters that
    /// manage their own key space.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for CommitKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "key#{}", self.0)
    }
}
