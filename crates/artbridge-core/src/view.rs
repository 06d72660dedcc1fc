// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Version-stamped caches of native object state.
//!
//! A [`CachedView`] mirrors one [`Section`] of a native object. Reads are
//! served from the cache while its stamp matches both the runtime clock and
//! the owner's per-object version; otherwise the section is fetched again.
//! Writes only touch the cache and mark the view dirty under the owner's
//! commit key. While dirty, the view never refetches: local edits win over a
//! stale-looking stamp until they are committed or discarded. A dirty view
//! also keeps its [`Item`] alive, so the handle cannot be re-wrapped under a
//! second commit key while the edits are pending.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::commit::Commitable;
use crate::error::BridgeError;
use crate::ident::NativeRef;
use crate::item::{Item, ItemState};
use crate::runtime::Runtime;
use crate::value::{CommitBatch, Section, StateRecord, Value};
use crate::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    clock: Version,
    local: u64,
}

/// Cached, lazily refreshed view of one section of a native object.
pub struct CachedView {
    this: Weak<CachedView>,
    owner: Rc<ItemState>,
    item: Weak<Item>,
    keep_alive: RefCell<Option<Rc<Item>>>,
    section: Section,
    fields: RefCell<StateRecord>,
    stamp: Cell<Option<Stamp>>,
    dirty: Cell<bool>,
}

impl CachedView {
    pub(crate) fn new(owner: Rc<ItemState>, item: Weak<Item>, section: Section) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            owner,
            item,
            keep_alive: RefCell::new(None),
            section,
            fields: RefCell::new(StateRecord::new()),
            stamp: Cell::new(None),
            dirty: Cell::new(false),
        })
    }

    /// Section mirrored by this view.
    pub fn section(&self) -> Section {
        self.section
    }

    /// Returns `true` while local edits are pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Returns `true` when the next read would refetch.
    pub fn is_stale(&self, rt: &Runtime) -> bool {
        !self.dirty.get() && self.stamp.get() != Some(self.current_stamp(rt))
    }

    /// Returns the full section, refreshing it first when stale.
    pub fn read(&self, rt: &Runtime) -> Result<StateRecord, BridgeError> {
        self.refresh_if_stale(rt)?;
        Ok(self.fields.borrow().clone())
    }

    /// Returns one field, refreshing the section first when stale.
    pub fn get(&self, rt: &Runtime, name: &str) -> Result<Option<Value>, BridgeError> {
        self.refresh_if_stale(rt)?;
        Ok(self.fields.borrow().get(name).cloned())
    }

    /// Sets one field locally and schedules the view for the next commit.
    ///
    /// A stale view is refreshed first so the committed section is complete.
    pub fn set(&self, rt: &Runtime, name: &str, value: Value) -> Result<(), BridgeError> {
        self.refresh_if_stale(rt)?;
        self.fields.borrow_mut().set(name, value);
        if !self.dirty.replace(true) {
            *self.keep_alive.borrow_mut() = self.item.upgrade();
            if let Some(this) = self.this.upgrade() {
                rt.mark_dirty(self.owner.commit_key(), this);
            }
        }
        Ok(())
    }

    fn current_stamp(&self, rt: &Runtime) -> Stamp {
        Stamp {
            clock: rt.current_version(),
            local: self.owner.version(),
        }
    }

    fn refresh_if_stale(&self, rt: &Runtime) -> Result<(), BridgeError> {
        let target = self.owner.native_ref()?;
        if self.dirty.get() {
            return Ok(());
        }
        let current = self.current_stamp(rt);
        if self.stamp.get() == Some(current) {
            return Ok(());
        }
        let record = rt.host().fetch_state(target, self.section)?;
        *self.fields.borrow_mut() = record;
        self.stamp.set(Some(current));
        Ok(())
    }
}

impl Commitable for CachedView {
    fn commit_target(&self) -> Result<NativeRef, BridgeError> {
        self.owner.native_ref()
    }

    fn stage(&self, batch: &mut CommitBatch) {
        batch.stage(self.section, self.fields.borrow().clone());
    }

    fn committed(&self, version: Version) {
        self.stamp.set(Some(Stamp {
            clock: version,
            local: self.owner.version(),
        }));
        self.dirty.set(false);
        drop(self.keep_alive.take());
    }

    fn discarded(&self) {
        self.stamp.set(None);
        self.dirty.set(false);
        drop(self.keep_alive.take());
    }
}

impl core::fmt::Debug for CachedView {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CachedView")
            .field("section", &self.section)
            .field("dirty", &self.dirty.get())
            .field("stamp", &self.stamp.get())
            .finish_non_exhaustive()
    }
}
