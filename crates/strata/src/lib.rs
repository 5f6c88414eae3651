//! # Strata
//!
//! A hierarchical service registry: nodes store service definitions, resolve
//! lookups locally first and then through their ancestors, and apply
//! per-service lifetimes (singleton, container, transient).
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use strata::prelude::*;
//!
//! struct Database {
//!     url: Arc<String>,
//! }
//!
//! impl Injectable for Database {
//!     fn construct(args: &Arguments) -> strata::Result<Self> {
//!         Ok(Self { url: args.get::<String>(0)? })
//!     }
//! }
//!
//! let app = Registry::of("facade-doc-example").unwrap();
//! app.set_value("database_url", String::from("postgres://localhost")).unwrap();
//! app.set(ServiceOptions::of_type::<Database>().dependency(Dependency::id("database_url")))
//!     .unwrap();
//!
//! let request = app.child("facade-doc-example-request").unwrap();
//! let database = request.get::<Database>(ServiceId::of::<Database>()).unwrap();
//! assert_eq!(database.url.as_str(), "postgres://localhost");
//! ```
//!
//! ## Architecture
//!
//! - `domain` - identifiers, scopes, constraints, policies and error kinds
//! - `infrastructure` - the resolution engine, configuration and logging

/// Domain layer - identifiers, scopes, constraints and errors
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use strata_domain::*;
}

/// Infrastructure layer - registry engine, configuration and logging
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use strata_infrastructure::*;
}

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the registry engine at the crate root
pub use infrastructure::container::{
    Arguments, CreateOptions, Dependency, Disposable, Injectable, LazyRef, Registry,
    RegistryListener, ServiceOptions, ServiceValue, TracingListener, TransientRef,
};

/// Everything needed to declare and resolve services
pub mod prelude {
    pub use crate::domain::{
        Constraints, Error, ResetStrategy, Result, Scope, ScopeFilter, ServiceId, Token,
    };
    pub use crate::infrastructure::container::{
        Argument, Arguments, CreateOptions, Dependency, Disposable, Injectable, LazyRef, Registry,
        RegistryListener, ServiceOptions, ServiceValue, SharedListener, TransientRef,
    };
}
