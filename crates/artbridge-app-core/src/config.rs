// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config storage port and the JSON service layered over it.
//!
//! Hosts persist small documents (runtime tuning, per-plugin preferences)
//! under logical keys. The [`ConfigStore`] port moves raw bytes; the
//! [`ConfigService`] owns the encoding so every adapter agrees on it.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage port for raw config blobs, keyed by logical name.
pub trait ConfigStore {
    /// Load the blob stored under `key`; [`ConfigError::NotFound`] when absent.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist `data` under `key`, replacing any previous blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// Key the store cannot map to a location.
    #[error("invalid config key {0:?}")]
    InvalidKey(String),
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Blob is not valid JSON for the requested type.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Adapter-specific failure.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values as pretty JSON and delegates storage to `S`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a service over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and decode the value under `key`.
    ///
    /// A missing key and an empty blob both yield `Ok(None)`.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Load the value under `key`, falling back to `T::default()`.
    ///
    /// Store and decode errors are logged, never returned, so an unreadable
    /// blob cannot keep the host from starting.
    pub fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key, "no stored config; using defaults");
                T::default()
            }
            Err(err) => {
                warn!(key, error = %err, "unreadable config; using defaults");
                T::default()
            }
        }
    }

    /// Encode and persist `value` under `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}
