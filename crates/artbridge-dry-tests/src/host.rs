// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scriptable fake of the native host.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use artbridge_core::{
    CommitBatch, Handle, NativeError, NativeHost, NativeRef, Section, StateRecord, TypeTag,
};

/// One object living in the fake host.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeObject {
    /// Type tag the object was created or seeded with.
    pub tag: TypeTag,
    /// Owning document.
    pub document: Handle,
    /// Native state per section; a missing section reads as empty.
    pub sections: BTreeMap<Section, StateRecord>,
}

/// In-memory [`NativeHost`] with call counters and failure toggles.
///
/// Clones share state, so a test keeps one clone for assertions and hands
/// another to the runtime. Committed batches replace whole sections of the
/// target object, matching how the real host applies a style or transform
/// record.
///
/// # Example
///
/// ```
/// use artbridge_core::{ItemKind, Runtime, Section, Value};
/// use artbridge_dry_tests::FakeNativeHost;
///
/// let host = FakeNativeHost::new();
/// let doc = host.add_document();
/// let rt = Runtime::new(host.clone());
///
/// let item = rt.create_item(ItemKind::Path, doc).unwrap();
/// item.style().unwrap().set(&rt, "stroked", Value::Bool(true)).unwrap();
/// assert_eq!(host.commit_count(), 0);
///
/// rt.commit_all();
/// assert_eq!(host.commit_count(), 1);
/// let handle = item.handle().unwrap();
/// let style = host.section(handle, Section::Style).unwrap();
/// assert_eq!(style.get("stroked"), Some(&Value::Bool(true)));
/// ```
#[derive(Clone, Default)]
pub struct FakeNativeHost {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    next_handle: u64,
    documents: BTreeSet<Handle>,
    objects: BTreeMap<Handle, FakeObject>,
    commit_log: Vec<CommitBatch>,
    create_count: usize,
    delete_count: usize,
    fetch_count: usize,
    commit_count: usize,
    fail_on_create: bool,
    fail_on_fetch: bool,
    fail_on_commit: bool,
    refuse_delete: bool,
    rejected_targets: BTreeSet<Handle>,
}

impl Inner {
    fn allocate(&mut self) -> Handle {
        self.next_handle += 1;
        Handle::from_raw(0x1000 + self.next_handle)
    }
}

impl FakeNativeHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a new document and return its handle.
    pub fn add_document(&self) -> Handle {
        let mut inner = self.lock();
        let handle = inner.allocate();
        inner.documents.insert(handle);
        handle
    }

    /// Close `document`, deleting every object it owns.
    pub fn close_document(&self, document: Handle) {
        let mut inner = self.lock();
        inner.documents.remove(&document);
        inner.objects.retain(|_, obj| obj.document != document);
    }

    /// Place an object at a chosen handle, as if the host created it outside
    /// the bridge. Replaces whatever lived there.
    pub fn seed_object(&self, handle: Handle, tag: TypeTag, document: Handle) {
        self.lock().objects.insert(
            handle,
            FakeObject {
                tag,
                document,
                sections: BTreeMap::new(),
            },
        );
    }

    /// Overwrite one section of an object, as an external edit would.
    pub fn set_section(&self, handle: Handle, section: Section, record: StateRecord) {
        if let Some(obj) = self.lock().objects.get_mut(&handle) {
            obj.sections.insert(section, record);
        }
    }

    /// Current native state of one section.
    pub fn section(&self, handle: Handle, section: Section) -> Option<StateRecord> {
        self.lock()
            .objects
            .get(&handle)
            .map(|obj| obj.sections.get(&section).cloned().unwrap_or_default())
    }

    /// Move an object to a fresh handle (type promotion, reload) and return
    /// the new handle. Returns `None` when `handle` is unknown.
    pub fn relocate(&self, handle: Handle) -> Option<Handle> {
        let mut inner = self.lock();
        let obj = inner.objects.remove(&handle)?;
        let moved = inner.allocate();
        inner.objects.insert(moved, obj);
        Some(moved)
    }

    /// Drop an object behind the bridge's back.
    pub fn forget_object(&self, handle: Handle) {
        self.lock().objects.remove(&handle);
    }

    /// Returns `true` while the host knows `handle`.
    pub fn contains(&self, handle: Handle) -> bool {
        self.lock().objects.contains_key(&handle)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// Every batch accepted so far, oldest first.
    pub fn commit_log(&self) -> Vec<CommitBatch> {
        self.lock().commit_log.clone()
    }

    /// Number of `create_object` attempts.
    pub fn create_count(&self) -> usize {
        self.lock().create_count
    }

    /// Number of `delete_object` attempts.
    pub fn delete_count(&self) -> usize {
        self.lock().delete_count
    }

    /// Number of `fetch_state` attempts.
    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count
    }

    /// Number of `commit_state` attempts, failed ones included.
    pub fn commit_count(&self) -> usize {
        self.lock().commit_count
    }

    /// Zero every call counter and clear the commit log.
    pub fn reset_counts(&self) {
        let mut inner = self.lock();
        inner.create_count = 0;
        inner.delete_count = 0;
        inner.fetch_count = 0;
        inner.commit_count = 0;
        inner.commit_log.clear();
    }

    /// Make `create_object` fail.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.lock().fail_on_create = fail;
    }

    /// Make `fetch_state` fail.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.lock().fail_on_fetch = fail;
    }

    /// Make every `commit_state` fail.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.lock().fail_on_commit = fail;
    }

    /// Make `delete_object` answer `false` without deleting.
    pub fn set_refuse_delete(&self, refuse: bool) {
        self.lock().refuse_delete = refuse;
    }

    /// Make commits addressed to `handle` fail until cleared.
    pub fn reject_commits_for(&self, handle: Handle, reject: bool) {
        let mut inner = self.lock();
        if reject {
            inner.rejected_targets.insert(handle);
        } else {
            inner.rejected_targets.remove(&handle);
        }
    }
}

impl NativeHost for FakeNativeHost {
    fn create_object(&self, document: Handle, tag: TypeTag) -> Result<Handle, NativeError> {
        let mut inner = self.lock();
        inner.create_count += 1;
        if inner.fail_on_create {
            return Err(NativeError::Rejected("simulated create failure".into()));
        }
        if !document.is_null() && !inner.documents.contains(&document) {
            return Err(NativeError::NotFound(document));
        }
        let handle = inner.allocate();
        inner.objects.insert(
            handle,
            FakeObject {
                tag,
                document,
                sections: BTreeMap::new(),
            },
        );
        Ok(handle)
    }

    fn delete_object(&self, target: NativeRef) -> Result<bool, NativeError> {
        let mut inner = self.lock();
        inner.delete_count += 1;
        if inner.refuse_delete {
            return Ok(false);
        }
        match inner.objects.remove(&target.object) {
            Some(_) => Ok(true),
            None => Err(NativeError::NotFound(target.object)),
        }
    }

    fn fetch_state(&self, target: NativeRef, section: Section) -> Result<StateRecord, NativeError> {
        let mut inner = self.lock();
        inner.fetch_count += 1;
        if inner.fail_on_fetch {
            return Err(NativeError::Rejected("simulated fetch failure".into()));
        }
        inner
            .objects
            .get(&target.object)
            .map(|obj| obj.sections.get(&section).cloned().unwrap_or_default())
            .ok_or(NativeError::NotFound(target.object))
    }

    fn commit_state(&self, batch: &CommitBatch) -> Result<(), NativeError> {
        let mut inner = self.lock();
        inner.commit_count += 1;
        let object = batch.target.object;
        if inner.fail_on_commit || inner.rejected_targets.contains(&object) {
            return Err(NativeError::Rejected("simulated commit failure".into()));
        }
        let Some(obj) = inner.objects.get_mut(&object) else {
            return Err(NativeError::NotFound(object));
        };
        for (section, record) in &batch.sections {
            obj.sections.insert(*section, record.clone());
        }
        inner.commit_log.push(batch.clone());
        Ok(())
    }
}
