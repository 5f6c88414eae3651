//! Lookup and materialization tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use strata_domain::{Error, ServiceId, Token};
use strata_infrastructure::container::{
    Arguments, Dependency, Injectable, Registry, ServiceOptions, ServiceValue,
};
use strata_infrastructure::error_ext::ErrorContext;

use super::node;

struct Greeter {
    greeting: Arc<String>,
    name: Option<Arc<String>>,
}

impl Injectable for Greeter {
    fn construct(args: &Arguments) -> strata_domain::Result<Self> {
        Ok(Self {
            greeting: args.get(0)?,
            name: args.optional(1)?,
        })
    }
}

struct Pool {
    size: usize,
}

#[test]
fn test_set_value_round_trip() {
    let registry = node("round-trip");
    registry.set_value("answer", 42_u32).unwrap();
    assert_eq!(*registry.get::<u32>("answer").unwrap(), 42);

    let token = Token::named("greeting");
    registry.set_value(&token, String::from("hi")).unwrap();
    assert_eq!(registry.get::<String>(&token).unwrap().as_str(), "hi");

    let shared: ServiceValue = Arc::new(String::from("same"));
    registry
        .set_shared_value("shared", Arc::clone(&shared))
        .unwrap();
    assert!(Arc::ptr_eq(&registry.resolve("shared").unwrap(), &shared));
}

#[test]
fn test_set_value_requires_name_or_token() {
    let registry = node("plain-value");
    let error = registry
        .set_value(ServiceId::of::<String>(), String::new())
        .unwrap_err();
    assert!(error.is_invalid_usage());
}

#[test]
fn test_resetting_an_id_replaces_the_record() {
    let registry = node("replace");
    registry.set_value("mode", String::from("a")).unwrap();
    registry.set_value("mode", String::from("b")).unwrap();
    assert_eq!(registry.get::<String>("mode").unwrap().as_str(), "b");
    assert_eq!(registry.len().unwrap(), 1);
}

#[test]
fn test_host_container_resolves_to_the_requesting_node() {
    let registry = node("host");
    let child = registry.child(&super::unique("host-child")).unwrap();

    assert!(child.contains(ServiceId::host_container()).unwrap());
    let host = child.get::<Registry>(ServiceId::host_container()).unwrap();
    assert_eq!(*host, child);

    let error = registry
        .set(ServiceOptions::new(ServiceId::host_container()).value(1_u8))
        .unwrap_err();
    assert!(error.is_invalid_usage());
}

#[test]
fn test_hierarchical_inheritance() {
    for depth in 0_u32..5 {
        let root = node("depth-root");
        root.set_value("level", depth).unwrap();

        let mut leaf = root.clone();
        for _ in 0..depth {
            leaf = leaf.child(&super::unique("depth-child")).unwrap();
        }

        if depth > 0 {
            assert!(leaf.get_with::<u32>("level", false).unwrap_err().is_not_found());
            let fallback = Arc::new(u32::MAX);
            let value = leaf
                .get_or_default("level", Arc::clone(&fallback), false)
                .unwrap();
            assert!(Arc::ptr_eq(&value, &fallback));
        }
        assert_eq!(*leaf.get::<u32>("level").unwrap(), depth);

        // The recursive hit imported the record into the leaf
        assert_eq!(*leaf.get_with::<u32>("level", false).unwrap(), depth);
    }
}

#[test]
fn test_missing_identifiers() {
    let registry = node("missing");
    assert!(registry.get::<u32>("nowhere").unwrap_err().is_not_found());
    assert!(registry.get_or_null::<u32>("nowhere").unwrap().is_none());

    let fallback = Arc::new(7_u32);
    let value = registry
        .get_or_default("nowhere", Arc::clone(&fallback), true)
        .unwrap();
    assert!(Arc::ptr_eq(&value, &fallback));
}

#[test]
fn test_type_mismatch() {
    let registry = node("mismatch");
    registry.set_value("small", 1_u8).unwrap();
    let error = registry.get::<u32>("small").unwrap_err();
    assert!(matches!(error, Error::TypeMismatch { .. }));
}

#[test]
fn test_record_without_factory_cannot_be_built() {
    let registry = node("no-factory");
    registry.set(ServiceOptions::new("empty")).unwrap();
    let error = registry.get::<u32>("empty").unwrap_err();
    assert!(matches!(error, Error::CannotInstantiate { .. }));

    registry
        .set(ServiceOptions::new(ServiceId::of::<u32>()))
        .unwrap();
    let error = registry.get::<u32>(ServiceId::of::<u32>()).unwrap_err();
    assert!(matches!(error, Error::CannotInstantiateBuiltIn { .. }));
}

#[test]
fn test_builtin_dependency_without_record() {
    let registry = node("builtin-dep");
    registry
        .set(
            ServiceOptions::new("length")
                .dependency(Dependency::of::<String>())
                .factory(|_, args| Ok(args.get::<String>(0)?.len())),
        )
        .unwrap();
    let error = registry.get::<usize>("length").unwrap_err();
    assert!(matches!(error, Error::CannotInstantiateBuiltIn { .. }));

    // A factory-backed record for the built-in makes it resolvable
    registry
        .set(ServiceOptions::new(ServiceId::of::<String>()).factory(|_, _| Ok(String::from("abc"))))
        .unwrap();
    assert_eq!(*registry.get::<usize>("length").unwrap(), 3);
}

#[test]
fn test_injectable_construction() {
    let registry = node("injectable");
    registry.set_value("greeting", String::from("hello")).unwrap();
    registry
        .set(
            ServiceOptions::of_type::<Greeter>()
                .dependency(Dependency::id("greeting"))
                .dependency(Dependency::id("name").optional()),
        )
        .unwrap();

    let greeter = registry.get::<Greeter>(ServiceId::of::<Greeter>()).unwrap();
    assert_eq!(greeter.greeting.as_str(), "hello");
    assert!(greeter.name.is_none());
}

#[test]
fn test_method_factory() {
    let registry = node("method");
    registry.set_value("pool", Pool { size: 4 }).unwrap();
    registry
        .set(
            ServiceOptions::new("pool-size")
                .method_factory("pool", |pool: &Pool, _args: &Arguments| Ok(pool.size)),
        )
        .unwrap();
    assert_eq!(*registry.get::<usize>("pool-size").unwrap(), 4);
}

#[test]
fn test_factory_errors_propagate() {
    let registry = node("factory-error");
    registry
        .set(
            ServiceOptions::new("port")
                .factory(|_, _| "eighty".parse::<u16>().context("invalid port")),
        )
        .unwrap();
    let error = registry.get::<u16>("port").unwrap_err();
    assert!(matches!(error, Error::Service { .. }));
}

#[test]
fn test_circular_dependencies_are_detected() {
    let registry = node("cycle");
    registry
        .set(
            ServiceOptions::new("a")
                .dependency(Dependency::id("b"))
                .factory(|_, _| Ok(1_u8)),
        )
        .unwrap();
    registry
        .set(
            ServiceOptions::new("b")
                .dependency(Dependency::id("a"))
                .factory(|_, _| Ok(2_u8)),
        )
        .unwrap();

    let error = registry.get::<u8>("a").unwrap_err();
    assert!(matches!(error, Error::CannotInstantiate { .. }));
}

#[test]
fn test_eager_services_build_on_registration() {
    let registry = node("eager");
    let built = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&built);
    registry
        .set(ServiceOptions::new("eager").eager().factory(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
    registry.get::<()>("eager").unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);

    let counter = Arc::clone(&built);
    registry
        .set(
            ServiceOptions::new("eager-transient")
                .transient()
                .eager()
                .factory(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        )
        .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_entries_in_insertion_order() {
    let registry = node("entries");
    registry.set_value("first", 1_u8).unwrap();
    registry.set_value("second", 2_u8).unwrap();
    registry.set(ServiceOptions::new("third").factory(|_, _| Ok(3_u8))).unwrap();

    let ids: Vec<ServiceId> = registry
        .entries()
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(
        ids,
        vec![
            ServiceId::name("first"),
            ServiceId::name("second"),
            ServiceId::name("third")
        ]
    );
    assert!(!registry.is_empty().unwrap());
}

#[test]
fn test_set_precompiled_ignores_declared_dependencies() {
    let registry = node("precompiled");
    registry.set_value("left", 2_u8).unwrap();
    registry.set_value("right", 5_u8).unwrap();

    let compiled = vec![Dependency::id("right").compile()];
    registry
        .set_precompiled(
            ServiceOptions::new("picked")
                .dependency(Dependency::id("left"))
                .factory(|_, args| Ok(*args.get::<u8>(0)?)),
            compiled,
        )
        .unwrap();
    assert_eq!(*registry.get::<u8>("picked").unwrap(), 5);

    let record = registry.record("picked", false).unwrap().unwrap();
    assert_eq!(record.dependencies().len(), 1);
}
