// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Version clock used to invalidate cached native state.

use std::cell::Cell;

/// Value of the [`VersionClock`].
///
/// # Invariants
/// - Starts at [`Version::ZERO`] and only ever moves forward by one.
/// - Saturates at `u64::MAX` instead of wrapping; at one cycle per script
///   statement that bound is never reached in practice.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Version(u64);

impl Version {
    /// Initial clock value.
    pub const ZERO: Self = Self(0);

    /// Constructs a `Version` from a raw counter value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the successor version.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Runtime-wide counter advanced exactly once per commit cycle.
///
/// A version change means "something, somewhere, may have changed": cached
/// views compare their stamp against [`VersionClock::current`] and refetch
/// when it moved.
#[derive(Debug, Default)]
pub struct VersionClock {
    current: Cell<Version>,
}

impl VersionClock {
    /// Creates a clock at [`Version::ZERO`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current clock value.
    pub fn current(&self) -> Version {
        self.current.get()
    }

    /// Advances the clock by one and returns the new value.
    pub(crate) fn advance(&self) -> Version {
        let next = self.current.get().next();
        self.current.set(next);
        next
    }
}
