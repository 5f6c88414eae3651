//! Reference handles built on extractable dependencies
//!
//! A [`LazyRef`] postpones a lookup until the consumer asks for it, which lets
//! two services depend on each other. A [`TransientRef`] hands out a fresh
//! instance of a transient service on every call.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use strata_domain::error::{Error, Result};
use strata_domain::value_objects::{Constraints, Scope, ServiceId};

use super::record::{Argument, downcast_value};
use super::registry::Registry;
use super::resolvable::{Dependency, LazyIdFn};

#[derive(Clone)]
enum Target {
    Eager(ServiceId),
    Lazy(LazyIdFn),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(id) => write!(f, "Eager({id})"),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Deferred lookup of a single service
pub struct LazyRef<T> {
    registry: Registry,
    target: Target,
    constraints: Constraints,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> LazyRef<T> {
    /// Look up `id` on `registry` when [`LazyRef::create`] is called
    ///
    /// `MANY` is ignored; a lazy reference always stands for one value.
    pub fn new(registry: &Registry, id: impl Into<ServiceId>, constraints: Constraints) -> Self {
        Self::with_target(registry, Target::Eager(id.into()), constraints)
    }

    /// Like [`LazyRef::new`], computing the identifier on every `create`
    pub fn deferred<F>(registry: &Registry, resolve: F, constraints: Constraints) -> Self
    where
        F: Fn() -> ServiceId + Send + Sync + 'static,
    {
        Self::with_target(registry, Target::Lazy(Arc::new(resolve)), constraints)
    }

    fn with_target(registry: &Registry, target: Target, constraints: Constraints) -> Self {
        Self {
            registry: registry.clone(),
            target,
            constraints: constraints.difference(Constraints::MANY),
            _marker: PhantomData,
        }
    }

    /// Identifier the reference currently points at
    pub fn identifier(&self) -> ServiceId {
        match &self.target {
            Target::Eager(id) => id.clone(),
            Target::Lazy(resolve) => resolve(),
        }
    }

    /// Resolve now; a miss fails even if the reference was declared optional
    pub fn create(&self) -> Result<Arc<T>> {
        let id = self.identifier();
        self.lookup(&id, self.constraints.difference(Constraints::OPTIONAL))?
            .ok_or_else(|| Error::not_found(id.to_string()))
    }

    /// Resolve now; `None` on a miss
    pub fn create_or_null(&self) -> Result<Option<Arc<T>>> {
        let id = self.identifier();
        self.lookup(&id, self.constraints | Constraints::OPTIONAL)
    }

    fn lookup(&self, id: &ServiceId, constraints: Constraints) -> Result<Option<Arc<T>>> {
        match self.registry.resolve_constrained(id, constraints)? {
            Argument::Value(value) => downcast_value(id, value).map(Some),
            Argument::Missing => Ok(None),
            Argument::Many(_) => Err(Error::invalid_usage(format!(
                "lazy reference to {id} resolved to a multi-group"
            ))),
        }
    }
}

impl<T> Clone for LazyRef<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            target: self.target.clone(),
            constraints: self.constraints,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for LazyRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRef")
            .field("registry", &self.registry.id())
            .field("target", &self.target)
            .field("constraints", &self.constraints)
            .finish()
    }
}

/// Factory handle for a transient service
pub struct TransientRef<T> {
    registry: Registry,
    id: ServiceId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TransientRef<T> {
    /// Bind to `id` on `registry`
    ///
    /// Fails with `InvalidUsage` when `id` is registered with a scope other
    /// than transient.
    pub fn new(registry: &Registry, id: impl Into<ServiceId>) -> Result<Self> {
        let id = id.into();
        if let Some(record) = registry.record(id.clone(), true)? {
            if record.scope() != Scope::Transient {
                return Err(Error::invalid_usage(format!(
                    "transient reference to {id} which is registered as {}",
                    record.scope()
                )));
            }
        }
        Ok(Self {
            registry: registry.clone(),
            id,
            _marker: PhantomData,
        })
    }

    /// Identifier the handle builds
    pub fn identifier(&self) -> &ServiceId {
        &self.id
    }

    /// Build a fresh instance owned by the caller
    pub fn create(&self) -> Result<Arc<T>> {
        self.registry.get_with(self.id.clone(), true)
    }
}

impl<T> Clone for TransientRef<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            id: self.id.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TransientRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientRef")
            .field("registry", &self.registry.id())
            .field("id", &self.id)
            .finish()
    }
}

impl Dependency {
    /// Inject a [`LazyRef<T>`] to `id` instead of the value itself
    ///
    /// Constraints declared on the dependency are carried by the reference.
    pub fn lazy_ref<T: Any + Send + Sync>(id: impl Into<ServiceId>) -> Self {
        let id = id.into();
        Self::extract(move |registry, constraints| {
            let reference = LazyRef::<T>::new(registry, id.clone(), constraints);
            Ok(Argument::Value(Arc::new(reference)))
        })
    }

    /// Inject a [`LazyRef<T>`] whose identifier is computed on every `create`
    pub fn lazy_ref_deferred<T, F>(resolve: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> ServiceId + Send + Sync + 'static,
    {
        let resolve = Arc::new(resolve);
        Self::extract(move |registry, constraints| {
            let resolve = Arc::clone(&resolve);
            let reference = LazyRef::<T>::deferred(registry, move || resolve(), constraints);
            Ok(Argument::Value(Arc::new(reference)))
        })
    }

    /// Inject a [`TransientRef<T>`] to `id`
    pub fn transient_ref<T: Any + Send + Sync>(id: impl Into<ServiceId>) -> Self {
        let id = id.into();
        Self::extract(move |registry, _| {
            let reference = TransientRef::<T>::new(registry, id.clone())?;
            Ok(Argument::Value(Arc::new(reference)))
        })
    }
}
