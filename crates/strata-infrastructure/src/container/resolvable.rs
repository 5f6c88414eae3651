//! Deferred-value wrappers and compiled dependencies
//!
//! Each declared [`Dependency`] is compiled once, at registration, into a
//! [`Resolvable`]: a wrapper telling the engine *how* to obtain the argument
//! plus an optional constraint bitmask telling it *where* to look.

use std::fmt;
use std::sync::Arc;

use strata_domain::error::{Error, Result};
use strata_domain::value_objects::{Constraints, ServiceId};

use super::record::Argument;
use super::registry::Registry;

/// Zero-argument function producing an identifier on demand
pub type LazyIdFn = Arc<dyn Fn() -> ServiceId + Send + Sync>;

/// Custom resolver bypassing ordinary lookup
pub type ExtractFn = Arc<dyn Fn(&Registry, Constraints) -> Result<Argument> + Send + Sync>;

/// How a dependency's identifier (or value) is obtained
#[derive(Clone)]
pub enum DeferredValue {
    /// Identifier known at declaration time
    Eager(ServiceId),
    /// Identifier computed at resolution time; supports forward references
    Lazy(LazyIdFn),
    /// Value produced by a custom resolver; constraints are passed through untouched
    Extractable(ExtractFn),
}

impl DeferredValue {
    /// Identifier this wrapper points at, evaluating lazy wrappers
    ///
    /// Extractable wrappers have no identifier.
    pub fn identifier(&self) -> Option<ServiceId> {
        match self {
            Self::Eager(id) => Some(id.clone()),
            Self::Lazy(resolve) => Some(resolve()),
            Self::Extractable(_) => None,
        }
    }
}

impl fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(id) => write!(f, "Eager({id})"),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
            Self::Extractable(_) => f.write_str("Extractable(..)"),
        }
    }
}

/// Compiled form of one declared dependency
#[derive(Debug, Clone)]
pub struct Resolvable {
    constraints: Option<Constraints>,
    wrapper: DeferredValue,
}

impl Resolvable {
    /// Pair a wrapper with optional constraints
    pub fn new(wrapper: DeferredValue, constraints: Option<Constraints>) -> Self {
        Self {
            constraints,
            wrapper,
        }
    }

    /// Explicitly declared constraints
    pub fn constraints(&self) -> Option<Constraints> {
        self.constraints
    }

    /// The deferred-value wrapper
    pub fn wrapper(&self) -> &DeferredValue {
        &self.wrapper
    }

    /// Obtain the argument this dependency stands for, using `registry` as the requesting node
    pub fn resolve(&self, registry: &Registry) -> Result<Argument> {
        let id = match &self.wrapper {
            DeferredValue::Extractable(extract) => {
                return extract(registry, self.constraints.unwrap_or_default());
            }
            DeferredValue::Eager(id) => id.clone(),
            DeferredValue::Lazy(resolve) => resolve(),
        };

        match self.constraints {
            Some(constraints) => registry.resolve_constrained(&id, constraints),
            None => {
                if let Some(tag) = id.builtin_type() {
                    if !registry.contains(id.clone())? {
                        return Err(Error::cannot_instantiate_builtin(tag.name()));
                    }
                }
                registry.resolve(id).map(Argument::Value)
            }
        }
    }
}

/// Declaration of one constructor/factory argument
///
/// # Example
///
/// ```
/// use strata_infrastructure::container::Dependency;
///
/// let logger = Dependency::id("logger").optional();
/// let plugins = Dependency::id("plugins").many().skip_self();
/// # let _ = (logger, plugins);
/// ```
#[derive(Debug, Clone)]
pub struct Dependency {
    wrapper: DeferredValue,
    constraints: Option<Constraints>,
}

impl Dependency {
    /// Depend on `id`, known now
    pub fn id(id: impl Into<ServiceId>) -> Self {
        Self::from_wrapper(DeferredValue::Eager(id.into()))
    }

    /// Depend on the type identifier of `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::id(ServiceId::of::<T>())
    }

    /// Depend on an identifier computed when the dependency is resolved
    pub fn lazy<F>(resolve: F) -> Self
    where
        F: Fn() -> ServiceId + Send + Sync + 'static,
    {
        Self::from_wrapper(DeferredValue::Lazy(Arc::new(resolve)))
    }

    /// Produce the argument with a custom resolver
    pub fn extract<F>(extract: F) -> Self
    where
        F: Fn(&Registry, Constraints) -> Result<Argument> + Send + Sync + 'static,
    {
        Self::from_wrapper(DeferredValue::Extractable(Arc::new(extract)))
    }

    pub(crate) fn from_wrapper(wrapper: DeferredValue) -> Self {
        Self {
            wrapper,
            constraints: None,
        }
    }

    /// Replace the constraint set
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    fn flag(mut self, flag: Constraints) -> Self {
        self.constraints = Some(self.constraints.unwrap_or_default() | flag);
        self
    }

    /// Substitute a missing argument instead of failing
    pub fn optional(self) -> Self {
        self.flag(Constraints::OPTIONAL)
    }

    /// Never ascend to the parent node
    pub fn self_only(self) -> Self {
        self.flag(Constraints::SELF)
    }

    /// Start the lookup at the parent node
    pub fn skip_self(self) -> Self {
        self.flag(Constraints::SKIP_SELF)
    }

    /// Resolve every value of the multi-group
    pub fn many(self) -> Self {
        self.flag(Constraints::MANY)
    }

    /// Compile into the form stored on records
    pub fn compile(self) -> Resolvable {
        Resolvable::new(self.wrapper, self.constraints)
    }
}
