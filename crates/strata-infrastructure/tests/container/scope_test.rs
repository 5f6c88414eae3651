//! Scope semantics across the node tree

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use strata_domain::Scope;
use strata_infrastructure::container::{Registry, ServiceOptions};

use super::{node, unique};

fn counting_factory(
    id: &str,
    scope: Scope,
) -> (ServiceOptions, Arc<AtomicUsize>) {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let options = ServiceOptions::new(id)
        .scope(scope)
        .factory(move |_, _| Ok(counter.fetch_add(1, Ordering::SeqCst)));
    (options, builds)
}

#[test]
fn test_singleton_is_shared_process_wide() {
    let id = unique("singleton");
    let first = node("singleton-a");
    let second = node("singleton-b");
    let nested = second.child(&unique("singleton-nested")).unwrap();

    let (options, builds) = counting_factory(&id, Scope::Singleton);
    first.set(options).unwrap();

    // Stored on the default node, not on the node that registered it
    let default = Registry::default_registry();
    assert!(first.record(id.as_str(), false).unwrap().is_none());
    assert!(default.record(id.as_str(), false).unwrap().is_some());

    let from_first = first.get::<usize>(id.as_str()).unwrap();
    let from_second = second.get::<usize>(id.as_str()).unwrap();
    let from_nested = nested.get::<usize>(id.as_str()).unwrap();
    assert!(Arc::ptr_eq(&from_first, &from_second));
    assert!(Arc::ptr_eq(&from_first, &from_nested));
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    let stored = default.record(id.as_str(), false).unwrap().unwrap();
    assert!(stored.has_value());
    assert!(nested.record(id.as_str(), false).unwrap().is_none());

    default.remove(id.as_str()).unwrap();
}

#[test]
fn test_container_scope_builds_one_instance_per_node() {
    let root = node("container-root");
    let left = root.child(&unique("container-left")).unwrap();
    let right = root.child(&unique("container-right")).unwrap();

    let (options, builds) = counting_factory("session", Scope::Container);
    root.set(options).unwrap();

    let on_left = left.get::<usize>("session").unwrap();
    let on_left_again = left.get::<usize>("session").unwrap();
    let on_right = right.get::<usize>("session").unwrap();
    let on_root = root.get::<usize>("session").unwrap();

    assert!(Arc::ptr_eq(&on_left, &on_left_again));
    assert!(!Arc::ptr_eq(&on_left, &on_right));
    assert!(!Arc::ptr_eq(&on_left, &on_root));
    assert_eq!(builds.load(Ordering::SeqCst), 3);

    // The child holds its own imported copy of the record
    let record = left.record("session", false).unwrap().unwrap();
    assert!(record.has_value());
    assert_eq!(record.scope(), Scope::Container);
}

#[test]
fn test_value_only_records_share_the_ancestor_value() {
    let root = node("value-root");
    let child = root.child(&unique("value-child")).unwrap();

    root.set_value("settings", vec![1_u8, 2, 3]).unwrap();
    let from_root = root.get::<Vec<u8>>("settings").unwrap();
    let from_child = child.get::<Vec<u8>>("settings").unwrap();
    assert!(Arc::ptr_eq(&from_root, &from_child));
}

#[test]
fn test_transient_scope_builds_on_every_lookup() {
    let registry = node("transient");
    let child = registry.child(&unique("transient-child")).unwrap();
    let (options, builds) = counting_factory("request-id", Scope::Transient);
    registry.set(options).unwrap();

    let first = registry.get::<usize>("request-id").unwrap();
    let second = registry.get::<usize>("request-id").unwrap();
    let third = child.get::<usize>("request-id").unwrap();
    assert_eq!((*first, *second, *third), (0, 1, 2));
    assert_eq!(builds.load(Ordering::SeqCst), 3);

    let record = registry.record("request-id", false).unwrap().unwrap();
    assert!(!record.has_value());
}
