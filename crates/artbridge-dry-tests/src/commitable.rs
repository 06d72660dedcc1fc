// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Counting `Commitable` for commit-cycle tests.

use std::cell::Cell;
use std::rc::Rc;

use artbridge_core::{
    BridgeError, CommitBatch, Commitable, Handle, NativeRef, Section, StateRecord, Value, Version,
};

/// `Commitable` that records how often the commit manager touched it.
///
/// Each stage writes a one-field record (`"stamp"`) into its section so
/// batches can be told apart on the fake host.
#[derive(Debug)]
pub struct CountingCommitable {
    target: Cell<Handle>,
    section: Section,
    stage_count: Cell<usize>,
    discard_count: Cell<usize>,
    committed_at: Cell<Option<Version>>,
}

impl CountingCommitable {
    /// Create a commitable targeting `target` (document-less) in `section`.
    pub fn new(target: Handle, section: Section) -> Rc<Self> {
        Rc::new(Self {
            target: Cell::new(target),
            section,
            stage_count: Cell::new(0),
            discard_count: Cell::new(0),
            committed_at: Cell::new(None),
        })
    }

    /// Point the commitable at another object (or `Handle::NULL`).
    pub fn retarget(&self, target: Handle) {
        self.target.set(target);
    }

    /// Number of times `stage` was called.
    pub fn stage_count(&self) -> usize {
        self.stage_count.get()
    }

    /// Number of times `discarded` was called.
    pub fn discard_count(&self) -> usize {
        self.discard_count.get()
    }

    /// Version passed to the last `committed` call.
    pub fn committed_at(&self) -> Option<Version> {
        self.committed_at.get()
    }
}

impl Commitable for CountingCommitable {
    fn commit_target(&self) -> Result<NativeRef, BridgeError> {
        let target = self.target.get();
        if target.is_null() {
            return Err(BridgeError::StaleHandle);
        }
        Ok(NativeRef::new(Handle::NULL, target))
    }

    fn stage(&self, batch: &mut CommitBatch) {
        self.stage_count.set(self.stage_count.get() + 1);
        let stamp = i64::try_from(self.stage_count.get()).unwrap_or(i64::MAX);
        batch.stage(self.section, StateRecord::new().with("stamp", Value::Int(stamp)));
    }

    fn committed(&self, version: Version) {
        self.committed_at.set(Some(version));
    }

    fn discarded(&self) {
        self.discard_count.set(self.discard_count.get() + 1);
    }
}
