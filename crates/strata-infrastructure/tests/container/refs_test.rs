//! Lazy and transient reference handles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use strata_domain::{Constraints, ServiceId};
use strata_infrastructure::container::{Dependency, LazyRef, ServiceOptions, TransientRef};

use super::{node, unique};

struct Client {
    server: Arc<LazyRef<Server>>,
}

struct Server {
    client: Arc<Client>,
}

#[test]
fn test_lazy_ref_resolves_forward_references() {
    let registry = node("lazy-forward");
    let reference = LazyRef::<u8>::new(&registry, "later", Constraints::empty());
    assert_eq!(reference.identifier(), ServiceId::name("later"));
    assert!(reference.create().unwrap_err().is_not_found());

    registry.set_value("later", 4_u8).unwrap();
    assert_eq!(*reference.create().unwrap(), 4);
    assert_eq!(*reference.clone().create().unwrap(), 4);
}

#[test]
fn test_lazy_ref_optional_handling() {
    let registry = node("lazy-optional");
    let reference = LazyRef::<u8>::new(&registry, "maybe", Constraints::OPTIONAL);
    assert!(reference.create().unwrap_err().is_not_found());
    assert!(reference.create_or_null().unwrap().is_none());

    // MANY is meaningless for a lazy reference and dropped
    registry.set_value("maybe", 1_u8).unwrap();
    let many = LazyRef::<u8>::new(&registry, "maybe", Constraints::MANY);
    assert_eq!(*many.create().unwrap(), 1);
}

#[test]
fn test_lazy_ref_respects_lookup_constraints() {
    let parent = node("lazy-parent");
    let child = parent.child(&unique("lazy-child")).unwrap();
    parent.set_value("level", 1_u8).unwrap();
    child.set_value("level", 2_u8).unwrap();

    let from_parent = LazyRef::<u8>::new(&child, "level", Constraints::SKIP_SELF);
    assert_eq!(*from_parent.create().unwrap(), 1);

    let only_child = LazyRef::<u8>::new(&child, "other", Constraints::SELF);
    parent.set_value("other", 3_u8).unwrap();
    assert!(only_child.create_or_null().unwrap().is_none());
}

#[test]
fn test_deferred_lazy_ref_recomputes_its_identifier() {
    let registry = node("lazy-deferred");
    registry.set_value("blue", 1_u8).unwrap();
    registry.set_value("green", 2_u8).unwrap();

    let current = Arc::new(Mutex::new(String::from("blue")));
    let selector = Arc::clone(&current);
    let reference = LazyRef::<u8>::deferred(
        &registry,
        move || ServiceId::name(selector.lock().unwrap().as_str()),
        Constraints::empty(),
    );
    assert_eq!(*reference.create().unwrap(), 1);

    *current.lock().unwrap() = String::from("green");
    assert_eq!(reference.identifier(), ServiceId::name("green"));
    assert_eq!(*reference.create().unwrap(), 2);
}

#[test]
fn test_lazy_dependency_is_evaluated_per_resolution() {
    let registry = node("lazy-dependency");
    registry.set_value("primary", String::from("db-1")).unwrap();
    registry.set_value("replica", String::from("db-2")).unwrap();

    let current = Arc::new(Mutex::new("primary"));
    let selector = Arc::clone(&current);
    registry
        .set(
            ServiceOptions::new("target")
                .transient()
                .dependency(Dependency::lazy(move || {
                    ServiceId::name(*selector.lock().unwrap())
                }))
                .factory(|_, args| Ok(args.get::<String>(0)?.to_string())),
        )
        .unwrap();

    assert_eq!(registry.get::<String>("target").unwrap().as_str(), "db-1");
    *current.lock().unwrap() = "replica";
    assert_eq!(registry.get::<String>("target").unwrap().as_str(), "db-2");
}

#[test]
fn test_lazy_ref_dependency_breaks_cycles() {
    let registry = node("lazy-cycle");
    registry
        .set(
            ServiceOptions::new("client")
                .dependency(Dependency::lazy_ref::<Server>("server"))
                .factory(|_, args| {
                    Ok(Client {
                        server: args.get::<LazyRef<Server>>(0)?,
                    })
                }),
        )
        .unwrap();
    registry
        .set(
            ServiceOptions::new("server")
                .dependency(Dependency::id("client"))
                .factory(|_, args| {
                    Ok(Server {
                        client: args.get::<Client>(0)?,
                    })
                }),
        )
        .unwrap();

    let server = registry.get::<Server>("server").unwrap();
    let client = registry.get::<Client>("client").unwrap();
    assert!(Arc::ptr_eq(&server.client, &client));
    assert!(Arc::ptr_eq(&client.server.create().unwrap(), &server));
}

#[test]
fn test_transient_ref_validation() {
    let registry = node("transient-ref");
    registry
        .set(ServiceOptions::new("cached").factory(|_, _| Ok(1_u8)))
        .unwrap();
    let error = TransientRef::<u8>::new(&registry, "cached").unwrap_err();
    assert!(error.is_invalid_usage());

    // Unregistered ids are accepted and fail on create
    let pending = TransientRef::<u8>::new(&registry, "pending").unwrap();
    assert_eq!(pending.identifier(), &ServiceId::name("pending"));
    assert!(pending.create().unwrap_err().is_not_found());
}

#[test]
fn test_transient_ref_builds_fresh_instances() {
    let registry = node("transient-fresh");
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    registry
        .set(
            ServiceOptions::new("ticket")
                .transient()
                .factory(move |_, _| Ok(counter.fetch_add(1, Ordering::SeqCst))),
        )
        .unwrap();
    registry
        .set(
            ServiceOptions::new("dispenser")
                .dependency(Dependency::transient_ref::<usize>("ticket"))
                .factory(|_, args| Ok((*args.get::<TransientRef<usize>>(0)?).clone())),
        )
        .unwrap();

    let dispenser = registry.get::<TransientRef<usize>>("dispenser").unwrap();
    let first = dispenser.create().unwrap();
    let second = dispenser.create().unwrap();
    assert_eq!((*first, *second), (0, 1));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}
