// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Handle-to-wrapper identity registry.
//!
//! One registry exists per entity class. It guarantees that at most one
//! wrapper is registered per handle, and it never creates wrappers itself:
//! only the caller knows which concrete kind to construct.
//!
//! Two retention tiers are supported:
//! - [`Retention::Weak`]: the registry holds only a weak reference. Once the
//!   script drops its last reference the wrapper is reclaimed and the entry
//!   becomes dead (it is pruned lazily).
//! - [`Retention::Soft`]: the registry additionally pins up to
//!   `soft_capacity` wrappers strongly. When the capacity is exceeded the least
//!   recently used pin is demoted to a weak entry, so a wrapper still held by
//!   the script keeps its identity while an unreferenced one is reclaimed.

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ident::Handle;

/// Retention tier of an [`IdentityRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Reclaim as soon as the script holds no reference.
    Weak,
    /// Keep recently used wrappers alive up to a capacity limit.
    Soft,
}

struct Pin<W> {
    wrapper: Rc<W>,
    last_used: u64,
}

/// Entry count below which the registry never sweeps on insert.
const MIN_SWEEP_LEN: usize = 64;

/// Identity map from [`Handle`] to the single live wrapper for it.
pub struct IdentityRegistry<W> {
    retention: Retention,
    soft_capacity: usize,
    entries: FxHashMap<Handle, Weak<W>>,
    pins: FxHashMap<Handle, Pin<W>>,
    // Pin recency, oldest first. Keys are the `last_used` ticks in `pins`.
    recency: BTreeMap<u64, Handle>,
    tick: u64,
    live_after_sweep: usize,
}

impl<W> IdentityRegistry<W> {
    /// Creates an empty registry.
    ///
    /// `soft_capacity` is ignored for [`Retention::Weak`].
    pub fn new(retention: Retention, soft_capacity: usize) -> Self {
        Self {
            retention,
            soft_capacity,
            entries: FxHashMap::default(),
            pins: FxHashMap::default(),
            recency: BTreeMap::new(),
            tick: 0,
            live_after_sweep: 0,
        }
    }

    /// Retention tier of this registry.
    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Looks up the live wrapper for `handle`. Never creates one.
    ///
    /// A hit refreshes the entry's soft-tier recency. Dead entries found
    /// along the way are dropped.
    pub fn resolve(&mut self, handle: Handle) -> Option<Rc<W>> {
        if handle.is_null() {
            return None;
        }
        let found = self.entries.get(&handle).map(Weak::upgrade);
        match found {
            Some(Some(wrapper)) => {
                self.pin(handle, &wrapper);
                Some(wrapper)
            }
            Some(None) => {
                trace!(%handle, "dropping reclaimed registry entry");
                self.entries.remove(&handle);
                None
            }
            None => None,
        }
    }

    /// Returns `true` when a live wrapper is registered for `handle`.
    ///
    /// Unlike [`IdentityRegistry::resolve`] this does not touch recency.
    pub fn contains(&self, handle: Handle) -> bool {
        self.entries
            .get(&handle)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Registers `wrapper` under `handle`, overwriting any previous mapping.
    ///
    /// Returns the previously registered live wrapper when it is a different
    /// instance. Registering under [`Handle::NULL`] is ignored.
    pub fn register(&mut self, handle: Handle, wrapper: &Rc<W>) -> Option<Rc<W>> {
        if handle.is_null() {
            debug!("ignoring registration under the null handle");
            return None;
        }
        self.sweep_if_due();
        let previous = self
            .entries
            .insert(handle, Rc::downgrade(wrapper))
            .and_then(|weak| weak.upgrade())
            .filter(|prev| !Rc::ptr_eq(prev, wrapper));
        if previous.is_some() {
            self.unpin(handle);
        }
        self.pin(handle, wrapper);
        trace!(%handle, "registered wrapper");
        previous
    }

    /// Moves `wrapper` from `old` to `new` without changing its identity.
    ///
    /// The old mapping is removed only if it still points at `wrapper`.
    /// Returns any different live wrapper displaced at `new`. No-op when
    /// `old == new`.
    pub fn rekey(&mut self, old: Handle, new: Handle, wrapper: &Rc<W>) -> Option<Rc<W>> {
        if old == new {
            return None;
        }
        let owns_old = self
            .entries
            .get(&old)
            .and_then(Weak::upgrade)
            .is_some_and(|current| Rc::ptr_eq(&current, wrapper));
        if owns_old {
            self.entries.remove(&old);
            self.unpin(old);
        }
        debug!(%old, %new, "rekeyed wrapper");
        self.register(new, wrapper)
    }

    /// Removes the mapping for `handle`, returning the wrapper if it was live.
    pub fn unregister(&mut self, handle: Handle) -> Option<Rc<W>> {
        self.unpin(handle);
        let removed = self.entries.remove(&handle).and_then(|weak| weak.upgrade());
        trace!(%handle, live = removed.is_some(), "unregistered");
        removed
    }

    /// Drops every entry whose wrapper has been reclaimed. Returns how many.
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        self.live_after_sweep = self.entries.len();
        before - self.entries.len()
    }

    /// Number of entries, including dead ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of wrappers currently pinned by the soft tier.
    pub fn pinned_len(&self) -> usize {
        self.pins.len()
    }

    fn sweep_if_due(&mut self) {
        let threshold = self.live_after_sweep.saturating_mul(2).max(MIN_SWEEP_LEN);
        if self.entries.len() >= threshold {
            let swept = self.purge();
            trace!(swept, live = self.entries.len(), "swept reclaimed entries");
        }
    }

    fn pin(&mut self, handle: Handle, wrapper: &Rc<W>) {
        if self.retention == Retention::Weak {
            return;
        }
        self.tick += 1;
        let tick = self.tick;
        match self.pins.get_mut(&handle) {
            Some(pin) => {
                self.recency.remove(&pin.last_used);
                pin.last_used = tick;
            }
            None => {
                self.pins.insert(
                    handle,
                    Pin {
                        wrapper: Rc::clone(wrapper),
                        last_used: tick,
                    },
                );
            }
        }
        self.recency.insert(tick, handle);
        while self.pins.len() > self.soft_capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            if let Some(pin) = self.pins.remove(&oldest) {
                trace!(handle = %oldest, shared = Rc::strong_count(&pin.wrapper) > 1, "demoted soft pin");
            }
        }
    }

    fn unpin(&mut self, handle: Handle) {
        if let Some(pin) = self.pins.remove(&handle) {
            self.recency.remove(&pin.last_used);
        }
    }
}

impl<W> Default for IdentityRegistry<W> {
    fn default() -> Self {
        Self::new(Retention::Weak, 0)
    }
}

impl<W> core::fmt::Debug for IdentityRegistry<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityRegistry")
            .field("retention", &self.retention)
            .field("entries", &self.entries.len())
            .field("pins", &self.pins.len())
            .finish_non_exhaustive()
    }
}
