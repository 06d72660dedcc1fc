// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime tuning knobs (persisted by `artbridge-app-core`).

use serde::{Deserialize, Serialize};

use crate::registry::Retention;

/// Settings for one [`crate::Runtime`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Retention tier of the item registry.
    pub item_retention: Retention,
    /// Retention tier of the document registry.
    pub document_retention: Retention,
    /// Strong pins kept per soft registry before LRU demotion.
    pub soft_capacity: usize,
    /// Consecutive failed cycles before a commit key is abandoned.
    pub max_commit_attempts: u32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            item_retention: Retention::Soft,
            document_retention: Retention::Weak,
            soft_capacity: 1024,
            max_commit_attempts: 3,
        }
    }
}
