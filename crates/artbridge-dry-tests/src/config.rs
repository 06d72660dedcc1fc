// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use artbridge_app_core::config::{ConfigError, ConfigStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of [`ConfigStore`] for settings tests.
///
/// Clones share one backing map, so a test can hand a clone to a
/// `ConfigService` and inspect the original afterwards.
///
/// # Example
///
/// ```
/// use artbridge_dry_tests::InMemoryConfigStore;
/// use artbridge_app_core::config::ConfigService;
/// use artbridge_app_core::settings::save_runtime_settings;
/// use artbridge_core::RuntimeSettings;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// save_runtime_settings(&service, &RuntimeSettings::default()).unwrap();
/// assert!(store.contains_key("runtime"));
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one raw blob under `key`.
    pub fn with_blob(key: &str, data: &[u8]) -> Self {
        let store = Self::new();
        store
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .insert(key.to_string(), data.to_vec());
        store
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fail_on_load = fail;
    }

    /// Configure the store to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fail_on_save = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .load_count
    }

    /// Number of `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save_count
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .contains_key(key)
    }

    /// Raw blob stored under `key`.
    pub fn blob(&self, key: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .get(key)
            .cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.load_count += 1;

        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }

        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_count += 1;

        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }

        inner.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}
