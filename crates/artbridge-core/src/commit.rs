// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Deferred commits: the dirty set and the commit cycle.
//!
//! Property writes never reach the host immediately. They mark a
//! [`Commitable`] dirty under a [`CommitKey`]; a later commit cycle stages
//! every commitable of a key into one [`CommitBatch`] and pushes it with a
//! single native call.
//!
//! Callers own the scheduling: [`crate::Runtime::commit_all`] must run before
//! any native read that has to observe pending writes, and at the end of each
//! externally triggered script invocation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::error::BridgeError;
use crate::ident::{CommitKey, NativeRef};
use crate::port::NativeHost;
use crate::value::CommitBatch;
use crate::version::{Version, VersionClock};

/// Object holding local mutations that must be flushed to the host.
///
/// State machine: `Clean -> (mark dirty) -> Dirty -> (flushed) -> Clean`.
pub trait Commitable {
    /// Object the staged state belongs to.
    ///
    /// Returns [`BridgeError::StaleHandle`] once the owner was removed.
    fn commit_target(&self) -> Result<NativeRef, BridgeError>;

    /// Writes the pending local state into `batch`.
    fn stage(&self, batch: &mut CommitBatch);

    /// Called after the host accepted the batch. `version` is the clock
    /// value of the cycle, before its advance.
    fn committed(&self, version: Version);

    /// Called when the pending edits are dropped without being flushed.
    fn discarded(&self) {}
}

struct DirtyEntry {
    members: Vec<Rc<dyn Commitable>>,
    failed_attempts: u32,
}

impl DirtyEntry {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            failed_attempts: 0,
        }
    }

    fn insert(&mut self, commitable: Rc<dyn Commitable>) -> bool {
        if self.members.iter().any(|m| Rc::ptr_eq(m, &commitable)) {
            return false;
        }
        self.members.push(commitable);
        true
    }
}

/// Outcome of one [`CommitManager::commit_all`] cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Clock value after the cycle's advance.
    pub version: Version,
    /// Number of commit keys flushed successfully.
    pub flushed: usize,
    /// One error per key that failed this cycle.
    pub failures: Vec<BridgeError>,
}

impl CommitReport {
    /// Returns `true` when every key flushed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns abandoned keys into a hard error.
    ///
    /// Keys still scheduled for retry are not errors yet.
    pub fn into_result(self) -> Result<Version, BridgeError> {
        match self
            .failures
            .into_iter()
            .find(|e| matches!(e, BridgeError::CommitAbandoned { .. }))
        {
            Some(err) => Err(err),
            None => Ok(self.version),
        }
    }
}

/// Dirty set keyed by [`CommitKey`].
///
/// Methods take `&self`: the dirty map is borrowed only for the bookkeeping
/// around a flush, never across a native call or a [`Commitable`] hook. A
/// hook or host callback may therefore mark more state dirty (it lands in
/// the next cycle) or query the manager while a cycle is running.
pub struct CommitManager {
    dirty: RefCell<BTreeMap<CommitKey, DirtyEntry>>,
    max_attempts: u32,
}

impl CommitManager {
    /// Creates an empty manager.
    ///
    /// A key that fails `max_attempts` cycles in a row is abandoned; values
    /// below one are treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            dirty: RefCell::new(BTreeMap::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Registers `commitable` under `key`.
    ///
    /// Idempotent: returns `false` if it was already pending under `key`.
    /// Performs no native calls.
    pub fn mark_dirty(&self, key: CommitKey, commitable: Rc<dyn Commitable>) -> bool {
        self.dirty
            .borrow_mut()
            .entry(key)
            .or_insert_with(DirtyEntry::new)
            .insert(commitable)
    }

    /// Returns `true` when `key` has pending commitables.
    pub fn is_dirty(&self, key: CommitKey) -> bool {
        self.dirty.borrow().contains_key(&key)
    }

    /// Number of pending keys.
    pub fn pending_keys(&self) -> usize {
        self.dirty.borrow().len()
    }

    /// Number of pending commitables across all keys.
    pub fn pending_commitables(&self) -> usize {
        self.dirty.borrow().values().map(|e| e.members.len()).sum()
    }

    /// Drops the pending commitables of `key` without flushing them.
    pub fn discard(&self, key: CommitKey) -> usize {
        let Some(entry) = self.dirty.borrow_mut().remove(&key) else {
            return 0;
        };
        for member in &entry.members {
            member.discarded();
        }
        debug!(%key, count = entry.members.len(), "discarded pending commits");
        entry.members.len()
    }

    /// Runs one commit cycle.
    ///
    /// Every key pending at the start is flushed with one native call; the
    /// dirty set then holds only keys scheduled for retry and anything
    /// marked during the cycle. The clock advances by exactly one, even when
    /// nothing was pending.
    pub fn commit_all(&self, host: &dyn NativeHost, clock: &VersionClock) -> CommitReport {
        let version = clock.current();
        let pending = std::mem::take(&mut *self.dirty.borrow_mut());
        let mut flushed = 0;
        let mut failures = Vec::new();
        for (key, entry) in pending {
            match flush(host, version, &entry.members) {
                Ok(()) => flushed += 1,
                Err(err) => failures.push(self.fail(key, entry, err)),
            }
        }
        let version = clock.advance();
        debug!(%version, flushed, failed = failures.len(), "commit cycle");
        CommitReport {
            version,
            flushed,
            failures,
        }
    }

    /// Flushes only `key`, leaving the clock untouched.
    ///
    /// Returns `Ok(false)` when nothing was pending under `key`.
    pub fn commit_key(
        &self,
        key: CommitKey,
        host: &dyn NativeHost,
        clock: &VersionClock,
    ) -> Result<bool, BridgeError> {
        let Some(entry) = self.dirty.borrow_mut().remove(&key) else {
            return Ok(false);
        };
        match flush(host, clock.current(), &entry.members) {
            Ok(()) => Ok(true),
            Err(err) => Err(self.fail(key, entry, err)),
        }
    }

    fn fail(&self, key: CommitKey, mut entry: DirtyEntry, err: BridgeError) -> BridgeError {
        entry.failed_attempts += 1;
        let attempts = entry.failed_attempts;
        let stale = matches!(err, BridgeError::StaleHandle);
        if stale || attempts >= self.max_attempts {
            error!(%key, attempts, error = %err, "abandoning pending commits");
            for member in &entry.members {
                member.discarded();
            }
            return BridgeError::CommitAbandoned {
                key,
                attempts,
                source: Box::new(err),
            };
        }
        warn!(%key, attempts, error = %err, "commit failed; retrying next cycle");
        let mut dirty = self.dirty.borrow_mut();
        let slot = dirty.entry(key).or_insert_with(DirtyEntry::new);
        slot.failed_attempts = slot.failed_attempts.max(attempts);
        for member in entry.members {
            slot.insert(member);
        }
        BridgeError::CommitFailed {
            key,
            source: Box::new(err),
        }
    }
}

impl Default for CommitManager {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Drop for CommitManager {
    fn drop(&mut self) {
        // Pending members may hold their items alive; release them.
        let dirty = std::mem::take(self.dirty.get_mut());
        for member in dirty.into_values().flat_map(|entry| entry.members) {
            member.discarded();
        }
    }
}

impl core::fmt::Debug for CommitManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommitManager")
            .field("pending_keys", &self.pending_keys())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

fn flush(
    host: &dyn NativeHost,
    version: Version,
    members: &[Rc<dyn Commitable>],
) -> Result<(), BridgeError> {
    let Some(first) = members.first() else {
        return Ok(());
    };
    let mut batch = CommitBatch::new(first.commit_target()?);
    for member in members {
        member.stage(&mut batch);
    }
    host.commit_state(&batch)?;
    for member in members {
        member.committed(version);
    }
    Ok(())
}
