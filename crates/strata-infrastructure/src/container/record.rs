//! Service records and the registration builder
//!
//! A [`ServiceRecord`] is the per-identifier entry a node stores. Callers never
//! build records directly; they describe a service with [`ServiceOptions`] and
//! hand it to [`Registry::set`](super::Registry::set), which compiles the
//! declared dependencies once and stores the record.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use strata_domain::error::{Error, Result};
use strata_domain::value_objects::{Scope, ServiceId, TypeTag};

use super::registry::Registry;
use super::resolvable::{Dependency, Resolvable};

/// A materialized service value
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// Factory closure building a value from resolved arguments
pub type FactoryFn = Arc<dyn Fn(&Registry, &Arguments) -> Result<ServiceValue> + Send + Sync>;

/// Method invoked on a resolved owner service
pub type MethodFn = Arc<dyn Fn(&ServiceValue, &Arguments) -> Result<ServiceValue> + Send + Sync>;

/// Teardown hook run when a cached value is disposed
pub type DisposeHook = Arc<dyn Fn(&ServiceValue) -> Result<()> + Send + Sync>;

/// Downcast a resolved value to `T`
pub fn downcast_value<T: Any + Send + Sync>(id: &ServiceId, value: ServiceValue) -> Result<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| Error::type_mismatch(id.to_string(), type_name::<T>()))
}

/// A type that can be constructed from resolved dependencies
///
/// This is the Rust rendering of "a constructable used to build the value":
/// the registry resolves the record's dependencies in declaration order and
/// passes them to [`Injectable::construct`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strata_infrastructure::container::{Arguments, Injectable};
///
/// struct Greeter {
///     name: Arc<String>,
/// }
///
/// impl Injectable for Greeter {
///     fn construct(args: &Arguments) -> strata_domain::Result<Self> {
///         Ok(Self { name: args.get::<String>(0)? })
///     }
/// }
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
    /// Build an instance from the resolved dependency arguments
    fn construct(args: &Arguments) -> Result<Self>;
}

/// A value with its own teardown step
pub trait Disposable: Any + Send + Sync {
    /// Release resources held by the value
    fn dispose(&self) -> Result<()>;
}

/// One resolved dependency
#[derive(Clone)]
pub enum Argument {
    /// A single value
    Value(ServiceValue),
    /// Every value of a multi-group, in registration order
    Many(Vec<ServiceValue>),
    /// An optional dependency that was not found
    Missing,
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Many(values) => write!(f, "Many(len={})", values.len()),
            Self::Missing => f.write_str("Missing"),
        }
    }
}

/// Resolved dependencies handed to factories and constructors
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    /// Wrap resolved arguments
    pub fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument at `index`
    pub fn argument(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    fn slot(&self, index: usize) -> Result<&Argument> {
        self.values.get(index).ok_or_else(|| {
            Error::invalid_usage(format!(
                "argument {index} requested but only {} were declared",
                self.values.len()
            ))
        })
    }

    /// Untyped single value at `index`
    pub fn value(&self, index: usize) -> Result<ServiceValue> {
        match self.slot(index)? {
            Argument::Value(value) => Ok(Arc::clone(value)),
            Argument::Missing => Err(Error::not_found(format!("argument #{index}"))),
            Argument::Many(_) => Err(Error::invalid_usage(format!(
                "argument {index} is a multi-value dependency"
            ))),
        }
    }

    /// Typed single value at `index`
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let id = ServiceId::name(format!("argument #{index}"));
        downcast_value(&id, self.value(index)?)
    }

    /// Typed optional value at `index`
    pub fn optional<T: Any + Send + Sync>(&self, index: usize) -> Result<Option<Arc<T>>> {
        match self.slot(index)? {
            Argument::Missing => Ok(None),
            _ => self.get(index).map(Some),
        }
    }

    /// Typed multi-group values at `index`
    pub fn many<T: Any + Send + Sync>(&self, index: usize) -> Result<Vec<Arc<T>>> {
        let id = ServiceId::name(format!("argument #{index}"));
        match self.slot(index)? {
            Argument::Many(values) => values
                .iter()
                .map(|value| downcast_value(&id, Arc::clone(value)))
                .collect(),
            Argument::Missing => Ok(Vec::new()),
            Argument::Value(_) => Err(Error::invalid_usage(format!(
                "argument {index} is a single-value dependency"
            ))),
        }
    }
}

/// How a record's value is produced by a factory
#[derive(Clone)]
pub enum Factory {
    /// Plain function of the resolved arguments
    Function(FactoryFn),
    /// Method called on another resolved service
    Method {
        /// Service the method is invoked on
        owner: ServiceId,
        /// The method itself
        call: MethodFn,
    },
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Method { owner, .. } => write!(f, "Method(owner={owner})"),
        }
    }
}

/// A constructable type bound to a record
#[derive(Clone, Copy)]
pub struct ServiceType {
    tag: TypeTag,
    construct: fn(&Arguments) -> Result<ServiceValue>,
}

fn construct_erased<T: Injectable>(args: &Arguments) -> Result<ServiceValue> {
    T::construct(args).map(|value| Arc::new(value) as ServiceValue)
}

impl ServiceType {
    /// Constructable for `T`
    pub fn of<T: Injectable>() -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            construct: construct_erased::<T>,
        }
    }

    /// Type tag of the constructed type
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub(crate) fn construct(&self, args: &Arguments) -> Result<ServiceValue> {
        (self.construct)(args)
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceType({})", self.tag.name())
    }
}

/// Per-identifier entry stored by a registry node
#[derive(Clone)]
pub struct ServiceRecord {
    pub(crate) id: ServiceId,
    pub(crate) scope: Scope,
    pub(crate) value: Option<ServiceValue>,
    pub(crate) service_type: Option<ServiceType>,
    pub(crate) factory: Option<Factory>,
    pub(crate) multiple: bool,
    pub(crate) eager: bool,
    pub(crate) dependencies: Arc<[Resolvable]>,
    pub(crate) dispose_hook: Option<DisposeHook>,
    /// Value shared with the ancestor this record was imported from
    pub(crate) inherited: bool,
}

impl ServiceRecord {
    /// Identifier the record is stored under (masked for multi-group members)
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// Caching policy
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Cached or explicitly supplied value
    pub fn value(&self) -> Option<&ServiceValue> {
        self.value.as_ref()
    }

    /// Whether a value is currently held
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the record can build its own value
    pub fn is_constructible(&self) -> bool {
        self.factory.is_some() || self.service_type.is_some()
    }

    /// Whether the record belongs to a multi-group
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Whether the value is built at registration time
    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Compiled dependencies in declaration order
    pub fn dependencies(&self) -> &[Resolvable] {
        &self.dependencies
    }

    /// Copy made when a node imports this record from an ancestor
    ///
    /// Container-scoped records that can build their own value start empty so
    /// the importing node gets its own instance; value-only records keep the
    /// ancestor's value since there is nothing to rebuild it from.
    pub(crate) fn imported(&self) -> Self {
        let mut record = self.clone();
        if record.scope == Scope::Container && record.is_constructible() {
            record.value = None;
        }
        record.inherited = record.value.is_some();
        record
    }

    /// Run the dispose hook on the held value, unless it belongs to an ancestor
    pub(crate) fn dispose_value(&self) -> Result<()> {
        match (&self.dispose_hook, &self.value) {
            (Some(hook), Some(value)) if !self.inherited => hook(value),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRecord")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("has_value", &self.value.is_some())
            .field("service_type", &self.service_type)
            .field("factory", &self.factory)
            .field("multiple", &self.multiple)
            .field("eager", &self.eager)
            .field("dependencies", &self.dependencies.len())
            .field("inherited", &self.inherited)
            .finish()
    }
}

/// Builder describing a service to register
///
/// # Example
///
/// ```
/// use strata_infrastructure::container::{Dependency, Registry, ServiceOptions};
///
/// let registry = Registry::of("record-doc-example").unwrap();
/// registry.set_value("greeting", String::from("hello")).unwrap();
/// registry
///     .set(
///         ServiceOptions::new("shout")
///             .transient()
///             .dependency(Dependency::id("greeting"))
///             .factory(|_, args| Ok(args.get::<String>(0)?.to_uppercase())),
///     )
///     .unwrap();
///
/// assert_eq!(*registry.get::<String>("shout").unwrap(), "HELLO");
/// ```
#[derive(Clone)]
pub struct ServiceOptions {
    pub(crate) id: ServiceId,
    pub(crate) scope: Scope,
    pub(crate) value: Option<ServiceValue>,
    pub(crate) service_type: Option<ServiceType>,
    pub(crate) factory: Option<Factory>,
    pub(crate) multiple: bool,
    pub(crate) eager: bool,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) dispose_hook: Option<DisposeHook>,
}

impl ServiceOptions {
    /// Describe a service registered under `id`
    pub fn new(id: impl Into<ServiceId>) -> Self {
        Self {
            id: id.into(),
            scope: Scope::default(),
            value: None,
            service_type: None,
            factory: None,
            multiple: false,
            eager: false,
            dependencies: Vec::new(),
            dispose_hook: None,
        }
    }

    /// Describe `T` registered under its own type identifier and built by it
    pub fn of_type<T: Injectable>() -> Self {
        Self::new(ServiceId::of::<T>()).service_type::<T>()
    }

    /// Identifier the service will be registered under
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// Set the caching policy
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Share one instance process-wide
    pub fn singleton(self) -> Self {
        self.scope(Scope::Singleton)
    }

    /// Build a new instance on every resolution
    pub fn transient(self) -> Self {
        self.scope(Scope::Transient)
    }

    /// Supply the value directly
    pub fn value<T: Any + Send + Sync>(self, value: T) -> Self {
        self.shared_value(Arc::new(value))
    }

    /// Supply an already shared value
    pub fn shared_value(mut self, value: ServiceValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Build the value with a function of the resolved dependencies
    pub fn factory<T, F>(mut self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Registry, &Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.factory = Some(Factory::Function(Arc::new(move |registry, args| {
            factory(registry, args).map(|value| Arc::new(value) as ServiceValue)
        })));
        self
    }

    /// Build the value by calling a method on another resolved service
    pub fn method_factory<O, T, F>(mut self, owner: impl Into<ServiceId>, method: F) -> Self
    where
        O: Any + Send + Sync,
        T: Any + Send + Sync,
        F: Fn(&O, &Arguments) -> Result<T> + Send + Sync + 'static,
    {
        let owner = owner.into();
        let owner_id = owner.clone();
        let call: MethodFn = Arc::new(move |value, args| {
            let any: &(dyn Any + Send + Sync) = &**value;
            let target = any
                .downcast_ref::<O>()
                .ok_or_else(|| Error::type_mismatch(owner_id.to_string(), type_name::<O>()))?;
            method(target, args).map(|value| Arc::new(value) as ServiceValue)
        });
        self.factory = Some(Factory::Method { owner, call });
        self
    }

    /// Build the value with `T`'s [`Injectable`] implementation
    pub fn service_type<T: Injectable>(mut self) -> Self {
        self.service_type = Some(ServiceType::of::<T>());
        self
    }

    /// Add the value to the multi-group of the identifier
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Build the value during registration (ignored for transient services)
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// Declare the next constructor/factory argument
    pub fn dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Declare several arguments at once
    pub fn dependencies<I: IntoIterator<Item = Dependency>>(mut self, dependencies: I) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    /// Run `hook` when a cached `T` value is disposed
    pub fn on_dispose<T, F>(mut self, hook: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        self.dispose_hook = Some(Arc::new(move |value| {
            let any: &(dyn Any + Send + Sync) = &**value;
            match any.downcast_ref::<T>() {
                Some(target) => hook(target),
                None => Ok(()),
            }
        }));
        self
    }

    /// Dispose cached values through their [`Disposable`] implementation
    pub fn disposable<T: Disposable>(self) -> Self {
        self.on_dispose(|value: &T| value.dispose())
    }

    pub(crate) fn into_record(self, id: ServiceId, dependencies: Arc<[Resolvable]>) -> ServiceRecord {
        ServiceRecord {
            id,
            scope: self.scope,
            value: self.value,
            service_type: self.service_type,
            factory: self.factory,
            multiple: self.multiple,
            eager: self.eager,
            dependencies,
            dispose_hook: self.dispose_hook,
            inherited: false,
        }
    }
}

impl fmt::Debug for ServiceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceOptions")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("has_value", &self.value.is_some())
            .field("multiple", &self.multiple)
            .field("eager", &self.eager)
            .field("dependencies", &self.dependencies.len())
            .finish()
    }
}
