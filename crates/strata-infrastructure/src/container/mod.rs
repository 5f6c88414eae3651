//! Hierarchical service registry
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `registry` | Registry nodes: lookup, scopes, multi-groups, disposal |
//! | `creation` | Default node and policy-driven node creation |
//! | `directory` | Process-wide node directory |
//! | `constraints` | `SELF` / `SKIP_SELF` / `OPTIONAL` / `MANY` evaluation |
//! | `resolvable` | Compiled dependencies and deferred identifiers |
//! | `refs` | Lazy and transient reference handles |
//! | `record` | Service records and the registration builder |
//! | `visitors` | Listener fan-out |
//! | `overlay` | Snapshot staging store |
//!
//! ## Usage
//!
//! ```
//! use strata_infrastructure::container::{Registry, ServiceOptions};
//!
//! let app = Registry::of("container-doc-example").unwrap();
//! let request = app.child("container-doc-example-request").unwrap();
//!
//! app.set_value("config", String::from("production")).unwrap();
//! app.set(ServiceOptions::new("counter").factory(|_, _| Ok(0_u32)))
//!     .unwrap();
//!
//! // Children see what their ancestors registered
//! assert_eq!(*request.get::<String>("config").unwrap(), "production");
//! assert_eq!(*request.get::<u32>("counter").unwrap(), 0);
//! ```

mod constraints;
pub mod creation;
pub mod directory;
pub mod overlay;
pub mod record;
pub mod refs;
pub mod registry;
pub mod resolvable;
pub mod visitors;

pub use creation::CreateOptions;
pub use directory::{RegistryDirectory, directory};
pub use overlay::OverlayMap;
pub use record::{
    Argument, Arguments, Disposable, DisposeHook, Factory, FactoryFn, Injectable, MethodFn,
    ServiceOptions, ServiceRecord, ServiceType, ServiceValue, downcast_value,
};
pub use refs::{LazyRef, TransientRef};
pub use registry::Registry;
pub use resolvable::{DeferredValue, Dependency, ExtractFn, LazyIdFn, Resolvable};
pub use visitors::{
    ListenerCollection, OrphanForwarder, RegistryListener, SharedListener, TracingListener,
};
