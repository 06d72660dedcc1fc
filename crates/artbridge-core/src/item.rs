// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Script-visible wrappers for native objects.
//!
//! An [`Item`] is the long-lived identity of one native object. Its mutable
//! bookkeeping (current handle, owning document, per-object version) lives
//! in a shared [`ItemState`] so cached views observe rekeys and removals.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::BridgeError;
use crate::ident::{CommitKey, Handle, NativeRef};
use crate::kind::ItemKind;
use crate::value::Section;
use crate::view::CachedView;

/// Wrapper for a native document, the scope of every item call.
#[derive(Debug)]
pub struct Document {
    handle: Handle,
}

impl Document {
    pub(crate) fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Current handle, or [`BridgeError::StaleHandle`] for a null document.
    pub fn handle(&self) -> Result<Handle, BridgeError> {
        live(self.handle)
    }

    /// Current handle without validity check.
    pub fn raw_handle(&self) -> Handle {
        self.handle
    }

    /// Returns `false` for a null document.
    pub fn is_valid(&self) -> bool {
        !self.handle.is_null()
    }
}

/// Shared bookkeeping of one item.
#[derive(Debug)]
pub struct ItemState {
    handle: Cell<Handle>,
    document: RefCell<Option<Rc<Document>>>,
    version: Cell<u64>,
    commit_key: CommitKey,
}

impl ItemState {
    pub(crate) fn new(handle: Handle, document: Option<Rc<Document>>, commit_key: CommitKey) -> Self {
        Self {
            handle: Cell::new(handle),
            document: RefCell::new(document),
            version: Cell::new(0),
            commit_key,
        }
    }

    /// Current handle; [`Handle::NULL`] once removed.
    pub fn handle(&self) -> Handle {
        self.handle.get()
    }

    /// Per-object version, bumped whenever this object's native state is
    /// known to have changed outside of a commit.
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Commit key shared by all sub-objects of this item.
    pub fn commit_key(&self) -> CommitKey {
        self.commit_key
    }

    /// Handle of the owning document, [`Handle::NULL`] if none.
    pub fn document_handle(&self) -> Handle {
        self.document
            .borrow()
            .as_ref()
            .map_or(Handle::NULL, |doc| doc.raw_handle())
    }

    /// Scope for native calls, or [`BridgeError::StaleHandle`] once removed.
    pub fn native_ref(&self) -> Result<NativeRef, BridgeError> {
        let object = live(self.handle.get())?;
        Ok(NativeRef::new(self.document_handle(), object))
    }

    pub(crate) fn set_handle(&self, handle: Handle) {
        self.handle.set(handle);
    }

    pub(crate) fn set_document(&self, document: Option<Rc<Document>>) {
        *self.document.borrow_mut() = document;
    }

    pub(crate) fn bump_version(&self) {
        self.version.set(self.version.get().saturating_add(1));
    }
}

/// Script-visible wrapper of one native art object.
///
/// A view with pending edits holds its item strongly until the edits are
/// committed or discarded, so the registry keeps resolving the same wrapper
/// (and the same commit key) for the handle even under weak retention.
pub struct Item {
    this: Weak<Item>,
    state: Rc<ItemState>,
    kind: ItemKind,
    style: OnceCell<Rc<CachedView>>,
    position: OnceCell<Rc<CachedView>>,
    bounds: OnceCell<Rc<CachedView>>,
}

impl Item {
    pub(crate) fn new(state: ItemState, kind: ItemKind) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            state: Rc::new(state),
            kind,
            style: OnceCell::new(),
            position: OnceCell::new(),
            bounds: OnceCell::new(),
        })
    }

    /// Concrete kind, fixed at construction.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Current handle, or [`BridgeError::StaleHandle`] once removed.
    pub fn handle(&self) -> Result<Handle, BridgeError> {
        live(self.state.handle())
    }

    /// Current handle without validity check.
    pub fn raw_handle(&self) -> Handle {
        self.state.handle()
    }

    /// Returns `false` once the item was removed. Never errors.
    pub fn is_valid(&self) -> bool {
        !self.state.handle().is_null()
    }

    /// Per-object version.
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    /// Commit key under which this item's views are flushed.
    pub fn commit_key(&self) -> CommitKey {
        self.state.commit_key()
    }

    /// Owning document handle.
    pub fn document_handle(&self) -> Handle {
        self.state.document_handle()
    }

    /// Path style view.
    pub fn style(&self) -> Result<Rc<CachedView>, BridgeError> {
        self.view(&self.style, Section::Style)
    }

    /// Position view.
    pub fn position(&self) -> Result<Rc<CachedView>, BridgeError> {
        self.view(&self.position, Section::Position)
    }

    /// Bounds view.
    pub fn bounds(&self) -> Result<Rc<CachedView>, BridgeError> {
        self.view(&self.bounds, Section::Bounds)
    }

    /// Shared bookkeeping, for adapters implementing their own commitables
    /// on top of this item.
    pub fn state(&self) -> &Rc<ItemState> {
        &self.state
    }

    fn view(
        &self,
        slot: &OnceCell<Rc<CachedView>>,
        section: Section,
    ) -> Result<Rc<CachedView>, BridgeError> {
        self.handle()?;
        Ok(Rc::clone(slot.get_or_init(|| {
            CachedView::new(Rc::clone(&self.state), self.this.clone(), section)
        })))
    }
}

impl core::fmt::Debug for Item {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Item")
            .field("kind", &self.kind)
            .field("handle", &self.state.handle())
            .field("version", &self.state.version())
            .finish_non_exhaustive()
    }
}

fn live(handle: Handle) -> Result<Handle, BridgeError> {
    if handle.is_null() {
        Err(BridgeError::StaleHandle)
    } else {
        Ok(handle)
    }
}
