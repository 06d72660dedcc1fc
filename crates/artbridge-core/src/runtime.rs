// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! The runtime context tying registries, clock and commits together.
//!
//! A [`Runtime`] is constructed explicitly and passed to every collaborator
//! instead of living in global state, so each test can build an isolated
//! instance. It is single-threaded: script execution, native callbacks and
//! commit cycles are serialized onto one thread by the host, and the
//! registries, dirty set and clock use plain `Cell`/`RefCell` interior
//! mutability. A port to a concurrent host must guard the whole runtime with
//! one lock so a commit, the dirty-set clear and the clock advance stay one
//! observable step.
//!
//! The lifecycle hooks here keep the three structures consistent:
//! - creation registers the new wrapper;
//! - a handle change rekeys the registry and bumps the wrapper's version;
//! - removal deletes natively, unregisters, drops pending commits and nulls
//!   the handle;
//! - a batch of external changes rekeys/bumps every known wrapper and then
//!   advances the clock once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info_span, trace};

use crate::commit::{CommitManager, CommitReport, Commitable};
use crate::error::{BridgeError, NativeError};
use crate::ident::{CommitKey, Handle};
use crate::item::{Document, Item, ItemState};
use crate::kind::{ItemKind, TypeTag};
use crate::port::NativeHost;
use crate::registry::IdentityRegistry;
use crate::settings::RuntimeSettings;
use crate::version::{Version, VersionClock};

/// Identity, versioning and commit context for one host session.
pub struct Runtime {
    host: Box<dyn NativeHost>,
    settings: RuntimeSettings,
    clock: VersionClock,
    commits: CommitManager,
    items: RefCell<IdentityRegistry<Item>>,
    documents: RefCell<IdentityRegistry<Document>>,
    next_commit_key: Cell<u64>,
}

impl Runtime {
    /// Creates a runtime with default settings.
    pub fn new(host: impl NativeHost + 'static) -> Self {
        Self::with_settings(host, RuntimeSettings::default())
    }

    /// Creates a runtime with explicit settings.
    pub fn with_settings(host: impl NativeHost + 'static, settings: RuntimeSettings) -> Self {
        Self {
            host: Box::new(host),
            clock: VersionClock::new(),
            commits: CommitManager::new(settings.max_commit_attempts),
            items: RefCell::new(IdentityRegistry::new(
                settings.item_retention,
                settings.soft_capacity,
            )),
            documents: RefCell::new(IdentityRegistry::new(
                settings.document_retention,
                settings.soft_capacity,
            )),
            next_commit_key: Cell::new(1),
            settings,
        }
    }

    /// Settings this runtime was built with.
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Host port.
    pub fn host(&self) -> &dyn NativeHost {
        self.host.as_ref()
    }

    /// Current clock value.
    pub fn current_version(&self) -> Version {
        self.clock.current()
    }

    /// Allocates a commit key unique within this runtime.
    pub fn allocate_commit_key(&self) -> CommitKey {
        let raw = self.next_commit_key.get();
        self.next_commit_key.set(raw + 1);
        CommitKey::from_raw(raw)
    }

    // ── commits ──────────────────────────────────────────────────────

    /// Schedules `commitable` under `key`. Idempotent; no native calls.
    pub fn mark_dirty(&self, key: CommitKey, commitable: Rc<dyn Commitable>) -> bool {
        self.commits.mark_dirty(key, commitable)
    }

    /// Number of commit keys with pending edits.
    pub fn pending_commits(&self) -> usize {
        self.commits.pending_keys()
    }

    /// Flushes every pending key and advances the clock once.
    pub fn commit_all(&self) -> CommitReport {
        let _span = info_span!("commit_all", version = %self.clock.current()).entered();
        self.commits.commit_all(self.host.as_ref(), &self.clock)
    }

    /// Flushes only `item`'s pending edits, before a native operation that
    /// must see them. With `invalidate`, the item's views refetch afterwards.
    ///
    /// Returns `Ok(false)` when nothing was pending.
    pub fn commit_item(&self, item: &Item, invalidate: bool) -> Result<bool, BridgeError> {
        item.handle()?;
        let flushed = self
            .commits
            .commit_key(item.commit_key(), self.host.as_ref(), &self.clock)?;
        if invalidate {
            item.state().bump_version();
        }
        Ok(flushed)
    }

    // ── identity ─────────────────────────────────────────────────────

    /// Looks up the wrapper registered for `handle`. Never creates one.
    pub fn resolve_item(&self, handle: Handle) -> Option<Rc<Item>> {
        self.items.borrow_mut().resolve(handle)
    }

    /// Looks up the document wrapper registered for `handle`.
    pub fn resolve_document(&self, handle: Handle) -> Option<Rc<Document>> {
        self.documents.borrow_mut().resolve(handle)
    }

    /// Resolves or creates the wrapper for a document handle.
    ///
    /// Returns `None` for [`Handle::NULL`].
    pub fn wrap_document(&self, handle: Handle) -> Option<Rc<Document>> {
        if handle.is_null() {
            return None;
        }
        let mut documents = self.documents.borrow_mut();
        if let Some(doc) = documents.resolve(handle) {
            return Some(doc);
        }
        let doc = Rc::new(Document::new(handle));
        documents.register(handle, &doc);
        Some(doc)
    }

    /// Resolves or creates the wrapper for an item handle reported by the
    /// host.
    ///
    /// An existing wrapper is reused only when `confirmed` is set, meaning
    /// the host vouches that the object at `handle` is the one wrapped
    /// before. Otherwise the handle may have been reused for a different
    /// object: a fresh wrapper of the kind dispatched from `tag` replaces the
    /// registry entry and the previous wrapper is invalidated.
    pub fn wrap_item(
        &self,
        handle: Handle,
        tag: TypeTag,
        document: Handle,
        confirmed: bool,
    ) -> Result<Rc<Item>, BridgeError> {
        if handle.is_null() {
            return Err(BridgeError::StaleHandle);
        }
        let existing = self.resolve_item(handle);
        if confirmed {
            if let Some(item) = existing {
                item.state().set_document(self.wrap_document(document));
                return Ok(item);
            }
        }
        let kind = ItemKind::from_tag(tag)?;
        if let Some(stale) = existing {
            debug!(%handle, "unconfirmed handle reuse; replacing wrapper");
            self.invalidate(&stale);
        }
        let item = self.construct(handle, kind, document);
        self.register(handle, &item);
        Ok(item)
    }

    // ── lifecycle hooks ──────────────────────────────────────────────

    /// Creates a new native object and registers its wrapper.
    pub fn create_item(&self, kind: ItemKind, document: Handle) -> Result<Rc<Item>, BridgeError> {
        let handle = self.host.create_object(document, kind.tag())?;
        if handle.is_null() {
            return Err(NativeError::Rejected("host returned the null handle".into()).into());
        }
        let item = self.construct(handle, kind, document);
        self.register(handle, &item);
        trace!(%handle, ?kind, "created item");
        Ok(item)
    }

    /// Moves `item` to `new_handle` after the host relocated the object
    /// (type promotion, save/reload).
    ///
    /// The wrapper keeps its identity; its views refetch on next read. A
    /// non-null `document` also updates the owning document.
    ///
    /// Fails with [`BridgeError::IdentityConflict`] when another valid
    /// wrapper already owns `new_handle`; nothing is changed in that case.
    pub fn change_handle(
        &self,
        item: &Rc<Item>,
        new_handle: Handle,
        document: Handle,
    ) -> Result<(), BridgeError> {
        let old = item.handle()?;
        if new_handle.is_null() {
            self.detach(item);
            return Ok(());
        }
        if let Some(other) = self.resolve_item(new_handle) {
            if !Rc::ptr_eq(&other, item) && other.is_valid() {
                return Err(BridgeError::IdentityConflict { handle: new_handle });
            }
        }
        self.rekey(old, new_handle, item);
        if !document.is_null() {
            item.state().set_document(self.wrap_document(document));
        }
        item.state().bump_version();
        Ok(())
    }

    /// Deletes the native object and invalidates its wrapper.
    ///
    /// Returns the host's answer. Fails with [`BridgeError::StaleHandle`]
    /// when the item was already removed.
    pub fn remove_item(&self, item: &Item) -> Result<bool, BridgeError> {
        let target = item.state().native_ref()?;
        let removed = self.host.delete_object(target)?;
        self.detach(item);
        Ok(removed)
    }

    /// Applies a batch of `(current, previous)` handle pairs reported by the
    /// host after external edits.
    ///
    /// A wrapper known under `previous` moves to `current`; otherwise the
    /// wrapper under `current` is used. Found wrappers get their per-object
    /// version bumped. Unknown handles are not wrapped. The clock advances
    /// once after the whole batch. Returns how many wrappers were updated.
    pub fn update_if_wrapped(&self, pairs: &[(Handle, Handle)]) -> usize {
        let mut updated = 0;
        for &(current, previous) in pairs {
            let mut found = None;
            if !previous.is_null() {
                if let Some(item) = self.resolve_item(previous) {
                    self.rekey(previous, current, &item);
                    found = Some(item);
                }
            }
            if found.is_none() {
                found = self.resolve_item(current);
            }
            if let Some(item) = found {
                item.state().bump_version();
                updated += 1;
            }
        }
        let version = self.clock.advance();
        debug!(%version, pairs = pairs.len(), updated, "applied external changes");
        updated
    }

    /// Drops registry entries of reclaimed wrappers. Returns how many.
    pub fn purge(&self) -> usize {
        self.items.borrow_mut().purge() + self.documents.borrow_mut().purge()
    }

    /// Number of item registry entries.
    pub fn registered_items(&self) -> usize {
        self.items.borrow().len()
    }

    fn construct(&self, handle: Handle, kind: ItemKind, document: Handle) -> Rc<Item> {
        let state = ItemState::new(
            handle,
            self.wrap_document(document),
            self.allocate_commit_key(),
        );
        Item::new(state, kind)
    }

    fn register(&self, handle: Handle, item: &Rc<Item>) {
        let displaced = self.items.borrow_mut().register(handle, item);
        if let Some(stale) = displaced {
            self.invalidate(&stale);
        }
    }

    fn rekey(&self, old: Handle, new: Handle, item: &Rc<Item>) {
        let displaced = self.items.borrow_mut().rekey(old, new, item);
        item.state().set_handle(new);
        if let Some(stale) = displaced {
            debug!(handle = %new, "rekey displaced a wrapper");
            self.invalidate(&stale);
        }
    }

    fn detach(&self, item: &Item) {
        let handle = item.raw_handle();
        let owned = self
            .resolve_item(handle)
            .is_some_and(|current| std::ptr::eq(Rc::as_ptr(&current), item));
        if owned {
            self.items.borrow_mut().unregister(handle);
        }
        self.invalidate(item);
    }

    fn invalidate(&self, item: &Item) {
        self.commits.discard(item.commit_key());
        item.state().set_handle(Handle::NULL);
    }
}

impl core::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runtime")
            .field("version", &self.clock.current())
            .field("commits", &self.commits)
            .field("items", &self.items.borrow())
            .field("documents", &self.documents.borrow())
            .finish_non_exhaustive()
    }
}
