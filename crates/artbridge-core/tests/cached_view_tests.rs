// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Refresh rules of versioned cached views.

use std::rc::Rc;

use artbridge_core::{
    BridgeError, Handle, Item, ItemKind, NativeError, Runtime, Section, StateRecord, Value,
};
use artbridge_dry_tests::{init_test_tracing, FakeNativeHost};

fn setup() -> (FakeNativeHost, Runtime, Rc<Item>) {
    init_test_tracing();
    let host = FakeNativeHost::new();
    let doc = host.add_document();
    let rt = Runtime::new(host.clone());
    let item = rt.create_item(ItemKind::Path, doc).unwrap();
    (host, rt, item)
}

fn style_record(width: f64) -> StateRecord {
    StateRecord::new()
        .with("stroke_width", Value::Float(width))
        .with("filled", Value::Bool(true))
}

#[test]
fn reads_within_one_version_fetch_once() {
    let (host, rt, item) = setup();
    host.set_section(item.handle().unwrap(), Section::Style, style_record(1.0));
    let style = item.style().unwrap();

    assert_eq!(
        style.get(&rt, "stroke_width").unwrap(),
        Some(Value::Float(1.0))
    );
    assert_eq!(style.read(&rt).unwrap(), style_record(1.0));
    assert_eq!(host.fetch_count(), 1);
    assert!(!style.is_stale(&rt));
}

#[test]
fn unrelated_cycle_triggers_exactly_one_refetch() {
    let (host, rt, item) = setup();
    let other = rt.create_item(ItemKind::Group, Handle::NULL).unwrap();
    let style = item.style().unwrap();
    style.read(&rt).unwrap();
    assert_eq!(host.fetch_count(), 1);

    other
        .position()
        .unwrap()
        .set(&rt, "origin", Value::Point { x: 1.0, y: 1.0 })
        .unwrap();
    rt.commit_all();
    let fetched_before = host.fetch_count();
    assert!(style.is_stale(&rt));

    style.read(&rt).unwrap();
    style.read(&rt).unwrap();
    assert_eq!(host.fetch_count(), fetched_before + 1);
}

#[test]
fn local_edits_win_over_external_changes_until_committed() {
    let (host, rt, item) = setup();
    let handle = item.handle().unwrap();
    host.set_section(handle, Section::Style, style_record(1.0));
    let style = item.style().unwrap();
    style.set(&rt, "stroke_width", Value::Float(3.0)).unwrap();
    let fetched = host.fetch_count();

    host.set_section(handle, Section::Style, style_record(9.0));
    assert_eq!(rt.update_if_wrapped(&[(handle, Handle::NULL)]), 1);

    assert!(!style.is_stale(&rt), "dirty views never look stale");
    assert_eq!(
        style.get(&rt, "stroke_width").unwrap(),
        Some(Value::Float(3.0))
    );
    assert_eq!(host.fetch_count(), fetched);
}

#[test]
fn committed_view_refetches_after_the_clock_advance() {
    let (host, rt, item) = setup();
    let handle = item.handle().unwrap();
    let style = item.style().unwrap();
    style.set(&rt, "stroke_width", Value::Float(2.5)).unwrap();
    rt.commit_all();
    assert!(!style.is_dirty());

    let fetched = host.fetch_count();
    assert_eq!(
        style.get(&rt, "stroke_width").unwrap(),
        Some(Value::Float(2.5))
    );
    assert_eq!(host.fetch_count(), fetched + 1);
    assert_eq!(
        host.section(handle, Section::Style)
            .unwrap()
            .get("stroke_width"),
        Some(&Value::Float(2.5))
    );
}

#[test]
fn set_on_a_stale_view_keeps_untouched_fields() {
    let (host, rt, item) = setup();
    let handle = item.handle().unwrap();
    host.set_section(handle, Section::Style, style_record(1.0));

    item.style()
        .unwrap()
        .set(&rt, "stroke_width", Value::Float(4.0))
        .unwrap();
    rt.commit_all();

    let native = host.section(handle, Section::Style).unwrap();
    assert_eq!(native.get("filled"), Some(&Value::Bool(true)));
    assert_eq!(native.get("stroke_width"), Some(&Value::Float(4.0)));
}

#[test]
fn per_object_version_invalidates_only_that_object() {
    let (host, rt, item) = setup();
    let other = rt.create_item(ItemKind::Path, Handle::NULL).unwrap();
    let mine = item.bounds().unwrap();
    let theirs = other.bounds().unwrap();
    mine.read(&rt).unwrap();
    theirs.read(&rt).unwrap();

    let handle = item.handle().unwrap();
    host.set_section(
        handle,
        Section::Bounds,
        StateRecord::new().with("frame", Value::Int(7)),
    );
    rt.update_if_wrapped(&[(handle, Handle::NULL)]);
    let fetched = host.fetch_count();

    assert_eq!(mine.get(&rt, "frame").unwrap(), Some(Value::Int(7)));
    theirs.read(&rt).unwrap();
    // Both refetch once: the batch also advanced the clock.
    assert_eq!(host.fetch_count(), fetched + 2);
    assert_eq!(item.version(), 1);
    assert_eq!(other.version(), 0);
}

#[test]
fn commit_item_with_invalidate_forces_a_refetch() {
    let (host, rt, item) = setup();
    let position = item.position().unwrap();
    position
        .set(&rt, "origin", Value::Point { x: 2.0, y: 3.0 })
        .unwrap();
    let version = item.version();

    assert_eq!(rt.commit_item(&item, true), Ok(true));
    assert_eq!(item.version(), version + 1);
    assert!(position.is_stale(&rt));

    let fetched = host.fetch_count();
    position.read(&rt).unwrap();
    assert_eq!(host.fetch_count(), fetched + 1);
}

#[test]
fn fetch_failure_surfaces_as_a_native_error() {
    let (host, rt, item) = setup();
    host.set_fail_on_fetch(true);
    let style = item.style().unwrap();

    assert!(matches!(
        style.read(&rt),
        Err(BridgeError::Native(NativeError::Rejected(_)))
    ));
    assert!(style.is_stale(&rt));

    host.set_fail_on_fetch(false);
    assert!(style.read(&rt).is_ok());
}

#[test]
fn views_are_shared_per_section() {
    let (_host, _rt, item) = setup();
    assert!(Rc::ptr_eq(&item.style().unwrap(), &item.style().unwrap()));
    assert!(!Rc::ptr_eq(&item.style().unwrap(), &item.bounds().unwrap()));
    assert_eq!(item.bounds().unwrap().section(), Section::Bounds);
}
