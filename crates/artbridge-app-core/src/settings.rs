// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Loading and saving [`RuntimeSettings`] through a [`ConfigService`].

use artbridge_core::RuntimeSettings;

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// Config key under which runtime settings are stored.
pub const RUNTIME_SETTINGS_KEY: &str = "runtime";

/// Loads runtime settings, falling back to defaults when missing or unreadable.
pub fn load_runtime_settings<S: ConfigStore>(service: &ConfigService<S>) -> RuntimeSettings {
    service.load_or_default(RUNTIME_SETTINGS_KEY)
}

/// Persists runtime settings.
pub fn save_runtime_settings<S: ConfigStore>(
    service: &ConfigService<S>,
    settings: &RuntimeSettings,
) -> Result<(), ConfigError> {
    service.save(RUNTIME_SETTINGS_KEY, settings)
}
