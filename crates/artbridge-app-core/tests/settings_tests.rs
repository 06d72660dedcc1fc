// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Runtime settings persistence through the config service.

use artbridge_app_core::config::{ConfigError, ConfigService};
use artbridge_app_core::settings::{
    load_runtime_settings, save_runtime_settings, RUNTIME_SETTINGS_KEY,
};
use artbridge_core::{Retention, RuntimeSettings};
use artbridge_dry_tests::{init_test_tracing, InMemoryConfigStore};

#[test]
fn missing_settings_load_as_defaults() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    assert_eq!(load_runtime_settings(&service), RuntimeSettings::default());
    assert_eq!(store.load_count(), 1);
}

#[test]
fn saved_settings_round_trip() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let settings = RuntimeSettings {
        item_retention: Retention::Weak,
        soft_capacity: 16,
        max_commit_attempts: 5,
        ..RuntimeSettings::default()
    };

    save_runtime_settings(&service, &settings).unwrap();
    assert!(store.contains_key(RUNTIME_SETTINGS_KEY));
    assert_eq!(load_runtime_settings(&service), settings);
}

#[test]
fn partial_blob_fills_in_defaults() {
    let store = InMemoryConfigStore::with_blob(RUNTIME_SETTINGS_KEY, br#"{"soft_capacity": 2}"#);
    let service = ConfigService::new(store);
    let loaded = load_runtime_settings(&service);
    assert_eq!(loaded.soft_capacity, 2);
    assert_eq!(loaded.item_retention, Retention::Soft);
    assert_eq!(loaded.document_retention, Retention::Weak);
}

#[test]
fn corrupt_blob_falls_back_to_defaults() {
    init_test_tracing();
    let store = InMemoryConfigStore::with_blob(RUNTIME_SETTINGS_KEY, b"{ not json");
    let service = ConfigService::new(store);
    assert_eq!(load_runtime_settings(&service), RuntimeSettings::default());
}

#[test]
fn store_failures_are_reported_on_save() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_save(true);
    let service = ConfigService::new(store.clone());

    let err = save_runtime_settings(&service, &RuntimeSettings::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Other(_)));
    assert_eq!(store.save_count(), 1);
    assert!(store.blob(RUNTIME_SETTINGS_KEY).is_none());
}

#[test]
fn retention_is_stored_in_snake_case() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    save_runtime_settings(&service, &RuntimeSettings::default()).unwrap();

    let blob = store.blob(RUNTIME_SETTINGS_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&blob).unwrap();
    assert_eq!(json["item_retention"], "soft");
    assert_eq!(json["document_retention"], "weak");
}

#[test]
fn empty_blob_counts_as_missing() {
    let store = InMemoryConfigStore::with_blob("prefs", b"");
    let service = ConfigService::new(store);
    assert!(service.load::<RuntimeSettings>("prefs").unwrap().is_none());
}
