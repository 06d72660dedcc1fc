// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Identity registry behavior observed through the runtime.

use std::rc::Rc;

use artbridge_core::kind::{art_type, text_type};
use artbridge_core::{
    BridgeError, Handle, IdentityRegistry, ItemKind, Retention, Runtime, RuntimeSettings,
    Section, StateRecord, TextKind, TypeTag, Value,
};
use artbridge_dry_tests::{init_test_tracing, FakeNativeHost};

fn runtime_with(settings: RuntimeSettings) -> (FakeNativeHost, Handle, Runtime) {
    init_test_tracing();
    let host = FakeNativeHost::new();
    let doc = host.add_document();
    let rt = Runtime::with_settings(host.clone(), settings);
    (host, doc, rt)
}

#[test]
fn resolving_twice_yields_the_same_wrapper() {
    let (_host, doc, rt) = runtime_with(RuntimeSettings::default());
    let item = rt.create_item(ItemKind::Path, doc).unwrap();
    let handle = item.handle().unwrap();

    let a = rt.resolve_item(handle).unwrap();
    let b = rt.resolve_item(handle).unwrap();
    assert!(Rc::ptr_eq(&a, &b));
    assert!(Rc::ptr_eq(&a, &item));
}

#[test]
fn rekey_moves_the_mapping_and_keeps_the_instance() {
    let mut reg = IdentityRegistry::new(Retention::Weak, 0);
    let w = Rc::new("wrapper");
    let h1 = Handle::from_raw(1);
    let h2 = Handle::from_raw(2);

    reg.register(h1, &w);
    reg.rekey(h1, h2, &w);

    assert!(reg.resolve(h1).is_none());
    assert!(Rc::ptr_eq(&reg.resolve(h2).unwrap(), &w));
}

#[test]
fn unseen_handle_is_never_wrapped_by_lookup() {
    let (host, doc, rt) = runtime_with(RuntimeSettings::default());
    let handle = Handle::from_raw(0x77);
    host.seed_object(handle, TypeTag::art(art_type::GROUP), doc);

    assert!(rt.resolve_item(handle).is_none());
    assert_eq!(rt.registered_items(), 0);
}

#[test]
fn confirmed_wrap_reuses_the_registered_wrapper() {
    let (host, doc, rt) = runtime_with(RuntimeSettings::default());
    let handle = Handle::from_raw(0x50);
    let tag = TypeTag::art(art_type::PATH);
    host.seed_object(handle, tag, doc);

    let first = rt.wrap_item(handle, tag, doc, false).unwrap();
    let again = rt.wrap_item(handle, tag, doc, true).unwrap();
    assert!(Rc::ptr_eq(&first, &again));
    assert_eq!(first.document_handle(), doc);
}

#[test]
fn unconfirmed_handle_reuse_replaces_the_old_wrapper() {
    let (host, doc, rt) = runtime_with(RuntimeSettings::default());
    let handle = Handle::from_raw(0x50);
    host.seed_object(handle, TypeTag::art(art_type::PATH), doc);
    let old = rt
        .wrap_item(handle, TypeTag::art(art_type::PATH), doc, false)
        .unwrap();

    // The host recycled the handle for a group.
    host.seed_object(handle, TypeTag::art(art_type::GROUP), doc);
    let fresh = rt
        .wrap_item(handle, TypeTag::art(art_type::GROUP), doc, false)
        .unwrap();

    assert!(!Rc::ptr_eq(&old, &fresh));
    assert_eq!(fresh.kind(), ItemKind::Group);
    assert!(!old.is_valid());
    assert_eq!(old.handle(), Err(BridgeError::StaleHandle));
    assert!(Rc::ptr_eq(&rt.resolve_item(handle).unwrap(), &fresh));
}

#[test]
fn text_frames_dispatch_on_the_text_subtype() {
    let (host, doc, rt) = runtime_with(RuntimeSettings::default());
    let handle = Handle::from_raw(0x90);
    let tag = TypeTag {
        art_type: art_type::TEXT_FRAME,
        text_type: text_type::AREA,
    };
    host.seed_object(handle, tag, doc);

    let item = rt.wrap_item(handle, tag, doc, false).unwrap();
    assert_eq!(item.kind(), ItemKind::TextFrame(TextKind::Area));
}

#[test]
fn unrecognized_type_is_rejected_without_registering() {
    let (_host, doc, rt) = runtime_with(RuntimeSettings::default());
    let handle = Handle::from_raw(0x33);

    let err = rt
        .wrap_item(handle, TypeTag::art(art_type::MESH), doc, false)
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnrecognizedType { art_type: found, .. } if found == art_type::MESH
    ));
    assert!(rt.resolve_item(handle).is_none());
}

#[test]
fn weak_items_are_reclaimed_once_dropped() {
    let settings = RuntimeSettings {
        item_retention: Retention::Weak,
        ..RuntimeSettings::default()
    };
    let (_host, doc, rt) = runtime_with(settings);
    let item = rt.create_item(ItemKind::Path, doc).unwrap();
    let handle = item.handle().unwrap();
    drop(item);

    assert!(rt.resolve_item(handle).is_none());
}

#[test]
fn dropped_item_with_pending_edits_keeps_its_identity() {
    let settings = RuntimeSettings {
        item_retention: Retention::Weak,
        ..RuntimeSettings::default()
    };
    let (host, doc, rt) = runtime_with(settings);
    let item = rt.create_item(ItemKind::Path, doc).unwrap();
    let handle = item.handle().unwrap();
    let key = item.commit_key();
    host.set_section(
        handle,
        Section::Style,
        StateRecord::new().with("width", Value::Int(1)),
    );
    item.style()
        .unwrap()
        .set(&rt, "width", Value::Int(5))
        .unwrap();
    drop(item);

    let again = rt.resolve_item(handle).unwrap();
    assert_eq!(again.commit_key(), key);
    let rewrapped = rt
        .wrap_item(handle, ItemKind::Path.tag(), doc, true)
        .unwrap();
    assert!(Rc::ptr_eq(&again, &rewrapped));

    let fetched = host.fetch_count();
    assert_eq!(
        again.style().unwrap().get(&rt, "width").unwrap(),
        Some(Value::Int(5))
    );
    assert_eq!(host.fetch_count(), fetched);
    assert_eq!(rt.pending_commits(), 1);
    drop(again);
    drop(rewrapped);

    rt.commit_all();
    assert_eq!(host.commit_count(), 1);
    assert_eq!(
        host.section(handle, Section::Style).unwrap().get("width"),
        Some(&Value::Int(5))
    );
    assert!(rt.resolve_item(handle).is_none(), "released once committed");
}

#[test]
fn demoted_soft_item_with_pending_edits_keeps_its_identity() {
    let settings = RuntimeSettings {
        item_retention: Retention::Soft,
        soft_capacity: 1,
        ..RuntimeSettings::default()
    };
    let (_host, doc, rt) = runtime_with(settings);
    let edited = rt.create_item(ItemKind::Path, doc).unwrap();
    let handle = edited.handle().unwrap();
    edited
        .position()
        .unwrap()
        .set(&rt, "origin", Value::Point { x: 1.0, y: 2.0 })
        .unwrap();
    let key = edited.commit_key();
    drop(edited);
    let _newer = rt.create_item(ItemKind::Group, doc).unwrap();

    let again = rt.resolve_item(handle).unwrap();
    assert_eq!(again.commit_key(), key);
    assert!(again.position().unwrap().is_dirty());
}

#[test]
fn short_lived_items_do_not_accumulate_registry_entries() {
    let settings = RuntimeSettings {
        item_retention: Retention::Weak,
        ..RuntimeSettings::default()
    };
    let (_host, doc, rt) = runtime_with(settings);
    let _document = rt.wrap_document(doc);
    for _ in 0..10_000 {
        let item = rt.create_item(ItemKind::Path, doc).unwrap();
        drop(item);
        rt.commit_all();
    }
    assert!(
        rt.registered_items() <= 64,
        "{} entries after churn",
        rt.registered_items()
    );
}

#[test]
fn soft_items_survive_until_demoted() {
    let settings = RuntimeSettings {
        item_retention: Retention::Soft,
        soft_capacity: 1,
        ..RuntimeSettings::default()
    };
    let (_host, doc, rt) = runtime_with(settings);
    let older = rt.create_item(ItemKind::Path, doc).unwrap();
    let newer = rt.create_item(ItemKind::Group, doc).unwrap();
    let (older_handle, newer_handle) = (older.handle().unwrap(), newer.handle().unwrap());
    drop(older);
    drop(newer);

    assert!(rt.resolve_item(older_handle).is_none());
    let kept = rt.resolve_item(newer_handle).unwrap();
    assert_eq!(kept.kind(), ItemKind::Group);
    assert_eq!(rt.purge(), 0);
}

#[test]
fn purge_drops_reclaimed_entries() {
    let settings = RuntimeSettings {
        item_retention: Retention::Weak,
        ..RuntimeSettings::default()
    };
    let (_host, doc, rt) = runtime_with(settings);
    let _document = rt.wrap_document(doc);
    for _ in 0..3 {
        let _ = rt.create_item(ItemKind::Raster, doc).unwrap();
    }
    assert_eq!(rt.registered_items(), 3);
    assert_eq!(rt.purge(), 3);
    assert_eq!(rt.registered_items(), 0);
}

#[test]
fn documents_are_shared_between_items() {
    let (_host, doc, rt) = runtime_with(RuntimeSettings::default());
    let a = rt.create_item(ItemKind::Path, doc).unwrap();
    let _b = rt.create_item(ItemKind::Path, doc).unwrap();

    let document = rt.resolve_document(doc).unwrap();
    assert!(document.is_valid());
    assert_eq!(a.document_handle(), document.handle().unwrap());
    assert!(rt.wrap_document(Handle::NULL).is_none());
}
