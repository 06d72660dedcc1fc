// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for ArtBridge hosts (uses platform config dir).

use artbridge_app_core::config::{ConfigError, ConfigStore};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Store configs as JSON files under a base directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at the user config directory (e.g., `~/.config/artbridge`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "ArtBridge")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir())
    }

    /// Create a store rooted at an explicit directory (plugin folder, tests).
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory the blobs are written to.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ConfigError::InvalidKey(key.to_string()));
        }
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.path_for(key)?;
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artbridge_app_core::config::ConfigService;
    use artbridge_app_core::settings::{load_runtime_settings, save_runtime_settings};

    #[test]
    fn missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn settings_survive_a_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
        let mut settings = load_runtime_settings(&service);
        settings.soft_capacity = 16;
        save_runtime_settings(&service, &settings).unwrap();
        assert!(dir.path().join("runtime.json").exists());
        assert_eq!(load_runtime_settings(&service).soft_capacity, 16);
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.save_raw("../escape", b"{}"), Err(ConfigError::InvalidKey(_))));
        assert!(matches!(store.load_raw(""), Err(ConfigError::InvalidKey(_))));
    }
}
