//! Resolution engine
//!
//! A [`Registry`] is one node of the registry tree. It stores service records
//! keyed by [`ServiceId`], resolves lookups locally first and then through its
//! ancestors, applies scope rules when building values and broadcasts every
//! lifecycle event to its listeners.
//!
//! ## Lookup
//!
//! | Location | Behavior |
//! |----------|----------|
//! | Local | the local record is materialized on this node |
//! | Parent | singleton records are materialized on the default node; anything else is imported into this node once and materialized here |
//! | None | the `_or_null` / `_or_default` family substitutes, the rest fail with `NotFound` |
//!
//! Locks are never held while factories, dispose hooks or listeners run, so
//! all of them may call back into the registry.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use strata_domain::error::{Error, Result};
use strata_domain::events::{IdentifierLocation, RetrievalEvent};
use strata_domain::value_objects::{MaskedId, ResetStrategy, Scope, ScopeFilter, ServiceId};
use tracing::{debug, trace, warn};

use super::directory::directory;
use super::overlay::OverlayMap;
use super::record::{Arguments, Factory, ServiceOptions, ServiceRecord, ServiceValue, downcast_value};
use super::resolvable::{Dependency, Resolvable};
use super::visitors::{ListenerCollection, OrphanForwarder, RegistryListener, SharedListener};
use crate::constants::REGISTRY_LOG_TARGET;
use crate::locks::{Guarded, lock_mutex, read_lock, write_lock};

thread_local! {
    /// (node address, record id) pairs currently being built on this thread
    static BUILDING: RefCell<Vec<(usize, ServiceId)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a record as under construction until dropped
struct BuildGuard;

impl BuildGuard {
    fn enter(registry: &Registry, id: &ServiceId) -> Result<Self> {
        let key = (registry.address(), id.clone());
        BUILDING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                return Err(Error::cannot_instantiate(
                    id.to_string(),
                    format!("circular dependency on registry '{}'", registry.id()),
                ));
            }
            stack.push(key);
            Ok(Self)
        })
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILDING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[derive(Default)]
struct NodeState {
    records: OverlayMap<ServiceId, ServiceRecord>,
    /// Public id -> masked member ids, in registration order
    groups: OverlayMap<ServiceId, Vec<ServiceId>>,
}

impl NodeState {
    /// Drop `member` from every group listing it, deleting groups left empty
    fn detach_member(&mut self, member: &ServiceId) {
        let owners: Vec<ServiceId> = self
            .groups
            .iter()
            .filter(|(_, members)| members.contains(member))
            .map(|(id, _)| id.clone())
            .collect();
        for owner in owners {
            let mut emptied = false;
            self.groups.update(&owner, |members| {
                members.retain(|candidate| candidate != member);
                emptied = members.is_empty();
            });
            if emptied {
                self.groups.remove(&owner);
            }
        }
    }

    /// Whether the value held by `record` belongs to the snapshot's base layer
    ///
    /// Such values come back when the snapshot ends, so they must not be
    /// disposed while staging.
    fn is_committed_value(&self, record: &ServiceRecord) -> bool {
        let (Some(value), Some(committed)) = (
            record.value.as_ref(),
            self.records.committed(&record.id).and_then(|base| base.value.as_ref()),
        ) else {
            return false;
        };
        self.records.is_staging() && Arc::ptr_eq(value, committed)
    }

    /// Keep only the evicted records whose values may be disposed now
    fn disposable(&self, evicted: Vec<ServiceRecord>) -> Vec<ServiceRecord> {
        evicted
            .into_iter()
            .filter(|record| !self.is_committed_value(record))
            .collect()
    }
}

/// (listener attached here, proxy placed on the default node)
type Forwarder = (SharedListener, SharedListener);

pub(crate) struct RegistryInner {
    id: String,
    parent: Option<Weak<RegistryInner>>,
    disposed: AtomicBool,
    state: RwLock<NodeState>,
    listeners: ListenerCollection,
    forwarders: Mutex<Vec<Forwarder>>,
}

/// Handle to one registry node
///
/// Handles are cheap to clone and compare equal when they point at the same
/// node.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub(crate) fn new_node(id: impl Into<String>, parent: Option<&Registry>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                id: id.into(),
                parent: parent.map(|parent| Arc::downgrade(&parent.inner)),
                disposed: AtomicBool::new(false),
                state: RwLock::new(NodeState::default()),
                listeners: ListenerCollection::new(),
                forwarders: Mutex::new(Vec::new()),
            }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Unique id of this node
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Live parent node, if any
    ///
    /// A parent that was dropped or disposed no longer counts.
    pub fn parent(&self) -> Option<Registry> {
        let inner = self.inner.parent.as_ref()?.upgrade()?;
        let parent = Registry { inner };
        (!parent.is_disposed()).then_some(parent)
    }

    /// Whether this is the process-wide default node
    pub fn is_default(&self) -> bool {
        self.ptr_eq(&Registry::default_registry())
    }

    /// Whether [`Registry::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::invalid_usage(format!(
                "registry '{}' has been disposed",
                self.inner.id
            )));
        }
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, NodeState>> {
        read_lock(&self.inner.state, Guarded::NodeState(&self.inner.id))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, NodeState>> {
        write_lock(&self.inner.state, Guarded::NodeState(&self.inner.id))
    }

    // ========================================================================
    // Presence
    // ========================================================================

    /// Whether `id` is registered here or, when `recursive`, on an ancestor
    ///
    /// `filter` restricts the check to single records or multi-groups.
    /// Virtual identifiers are always present.
    pub fn has(&self, id: &ServiceId, recursive: bool, filter: ScopeFilter) -> Result<bool> {
        self.ensure_live()?;
        if id.is_virtual() {
            return Ok(true);
        }
        if self.has_local(id, filter)? {
            return Ok(true);
        }
        match self.parent() {
            Some(parent) if recursive => parent.has(id, true, filter),
            _ => Ok(false),
        }
    }

    /// Whether `id` is reachable from this node as a record or multi-group
    pub fn contains(&self, id: impl Into<ServiceId>) -> Result<bool> {
        self.has(&id.into(), true, ScopeFilter::Any)
    }

    fn has_local(&self, id: &ServiceId, filter: ScopeFilter) -> Result<bool> {
        let state = self.read_state()?;
        Ok((filter.includes_single() && state.records.contains_key(id))
            || (filter.includes_many() && state.groups.contains_key(id)))
    }

    /// Record stored for `id`, without importing it or building its value
    pub fn record(&self, id: impl Into<ServiceId>, recursive: bool) -> Result<Option<ServiceRecord>> {
        self.ensure_live()?;
        let id = id.into();
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            let found = node.read_state()?.records.get(&id).cloned();
            if found.is_some() {
                return Ok(found);
            }
            cursor = if recursive { node.parent() } else { None };
        }
        Ok(None)
    }

    // ========================================================================
    // Single-value lookup
    // ========================================================================

    /// Resolve `id`, ascending to ancestors
    pub fn resolve(&self, id: impl Into<ServiceId>) -> Result<ServiceValue> {
        self.resolve_with(&id.into(), true)
    }

    /// Resolve `id`; fails with `NotFound` on a miss
    pub fn resolve_with(&self, id: &ServiceId, recursive: bool) -> Result<ServiceValue> {
        self.resolve_or_null(id, recursive)?
            .ok_or_else(|| Error::not_found(id.to_string()))
    }

    /// Resolve `id`; `None` on a miss
    pub fn resolve_or_null(&self, id: &ServiceId, recursive: bool) -> Result<Option<ServiceValue>> {
        let (location, value) = self.fetch(id, recursive)?;
        self.notify_retrieval(RetrievalEvent::single(id.clone(), recursive, location))?;
        Ok(value)
    }

    /// Resolve `id` as `T`, ascending to ancestors
    pub fn get<T: Any + Send + Sync>(&self, id: impl Into<ServiceId>) -> Result<Arc<T>> {
        self.get_with(id, true)
    }

    /// Resolve `id` as `T`
    pub fn get_with<T: Any + Send + Sync>(
        &self,
        id: impl Into<ServiceId>,
        recursive: bool,
    ) -> Result<Arc<T>> {
        let id = id.into();
        let value = self.resolve_with(&id, recursive)?;
        downcast_value(&id, value)
    }

    /// Resolve `id` as `T`, ascending to ancestors; `None` on a miss
    pub fn get_or_null<T: Any + Send + Sync>(&self, id: impl Into<ServiceId>) -> Result<Option<Arc<T>>> {
        let id = id.into();
        self.resolve_or_null(&id, true)?
            .map(|value| downcast_value(&id, value))
            .transpose()
    }

    /// Resolve `id` as `T`; `default` on a miss
    pub fn get_or_default<T: Any + Send + Sync>(
        &self,
        id: impl Into<ServiceId>,
        default: Arc<T>,
        recursive: bool,
    ) -> Result<Arc<T>> {
        let id = id.into();
        match self.resolve_or_null(&id, recursive)? {
            Some(value) => downcast_value(&id, value),
            None => Ok(default),
        }
    }

    fn fetch(
        &self,
        id: &ServiceId,
        recursive: bool,
    ) -> Result<(IdentifierLocation, Option<ServiceValue>)> {
        self.ensure_live()?;
        if id.is_virtual() {
            let host: ServiceValue = Arc::new(self.clone());
            return Ok((IdentifierLocation::Local, Some(host)));
        }
        match self.resolve_metadata(id, recursive)? {
            (location, Some((owner, record))) => Ok((location, Some(owner.materialize(record)?))),
            (location, None) => Ok((location, None)),
        }
    }

    /// Find the record for `id` and the node that must build it
    fn resolve_metadata(
        &self,
        id: &ServiceId,
        recursive: bool,
    ) -> Result<(IdentifierLocation, Option<(Registry, ServiceRecord)>)> {
        let local = self.read_state()?.records.get(id).cloned();
        if let Some(record) = local {
            return Ok((IdentifierLocation::Local, Some((self.clone(), record))));
        }
        if !recursive {
            return Ok((IdentifierLocation::None, None));
        }

        let mut cursor = self.parent();
        while let Some(node) = cursor {
            let found = node.read_state()?.records.get(id).cloned();
            if let Some(record) = found {
                if record.scope == Scope::Singleton {
                    let default = Registry::default_registry();
                    let canonical = default.read_state()?.records.get(id).cloned();
                    let owner = if canonical.is_some() { default } else { node };
                    return Ok((
                        IdentifierLocation::Parent,
                        Some((owner, canonical.unwrap_or(record))),
                    ));
                }
                let imported = record.imported();
                self.write_state()?
                    .records
                    .insert(id.clone(), imported.clone());
                trace!(
                    target: REGISTRY_LOG_TARGET,
                    registry = self.id(),
                    from = node.id(),
                    id = %id,
                    "Record imported"
                );
                return Ok((IdentifierLocation::Parent, Some((self.clone(), imported))));
            }
            cursor = node.parent();
        }
        Ok((IdentifierLocation::None, None))
    }

    /// Build (or return the cached) value of a record stored on this node
    fn materialize(&self, record: ServiceRecord) -> Result<ServiceValue> {
        if let Some(value) = record.value {
            return Ok(value);
        }

        let _guard = BuildGuard::enter(self, &record.id)?;
        let value = match (&record.factory, &record.service_type) {
            (Some(Factory::Function(build)), _) => {
                let args = self.resolve_arguments(&record.dependencies)?;
                build(self, &args)?
            }
            (Some(Factory::Method { owner, call }), _) => {
                let args = self.resolve_arguments(&record.dependencies)?;
                let target = self.resolve_with(owner, true)?;
                call(&target, &args)?
            }
            (None, Some(service_type)) => {
                let args = self.resolve_arguments(&record.dependencies)?;
                service_type.construct(&args)?
            }
            (None, None) => {
                return Err(match record.id.builtin_type() {
                    Some(tag) => Error::cannot_instantiate_builtin(tag.name()),
                    None => Error::cannot_instantiate(
                        record.id.to_string(),
                        "record has neither a factory nor a type",
                    ),
                });
            }
        };

        if !record.scope.caches_value() {
            return Ok(value);
        }

        // First value cached wins; a concurrent build returns the stored one.
        let mut state = self.write_state()?;
        let mut cached = None;
        state.records.update(&record.id, |stored| {
            cached = Some(Arc::clone(
                stored.value.get_or_insert_with(|| Arc::clone(&value)),
            ));
        });
        Ok(cached.unwrap_or(value))
    }

    fn resolve_arguments(&self, dependencies: &[Resolvable]) -> Result<Arguments> {
        dependencies
            .iter()
            .map(|dependency| dependency.resolve(self))
            .collect::<Result<Vec<_>>>()
            .map(Arguments::new)
    }

    // ========================================================================
    // Multi-value lookup
    // ========================================================================

    /// Resolve every value of the multi-group `id`, ascending to ancestors
    pub fn resolve_many(&self, id: impl Into<ServiceId>) -> Result<Vec<ServiceValue>> {
        self.resolve_many_with(&id.into(), true)
    }

    /// Resolve every value of the multi-group `id`; fails with `NotFound` on a miss
    pub fn resolve_many_with(&self, id: &ServiceId, recursive: bool) -> Result<Vec<ServiceValue>> {
        self.resolve_many_or_null(id, recursive)?
            .ok_or_else(|| Error::not_found(id.to_string()))
    }

    /// Resolve every value of the multi-group `id`; `None` on a miss
    pub fn resolve_many_or_null(
        &self,
        id: &ServiceId,
        recursive: bool,
    ) -> Result<Option<Vec<ServiceValue>>> {
        let (location, members) = self.group_members(id, recursive)?;
        let values = match members {
            Some(members) => Some(
                members
                    .iter()
                    .map(|member| self.resolve_member(member))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        self.notify_retrieval(RetrievalEvent::many(id.clone(), recursive, location))?;
        Ok(values)
    }

    /// Typed values of the multi-group `id`, in registration order
    pub fn get_many<T: Any + Send + Sync>(&self, id: impl Into<ServiceId>) -> Result<Vec<Arc<T>>> {
        self.get_many_with(id, true)
    }

    /// Typed values of the multi-group `id`
    pub fn get_many_with<T: Any + Send + Sync>(
        &self,
        id: impl Into<ServiceId>,
        recursive: bool,
    ) -> Result<Vec<Arc<T>>> {
        let id = id.into();
        self.resolve_many_with(&id, recursive)?
            .into_iter()
            .map(|value| downcast_value(&id, value))
            .collect()
    }

    /// Typed values of the multi-group `id`, ascending to ancestors; `None` on a miss
    pub fn get_many_or_null<T: Any + Send + Sync>(
        &self,
        id: impl Into<ServiceId>,
    ) -> Result<Option<Vec<Arc<T>>>> {
        let id = id.into();
        self.resolve_many_or_null(&id, true)?
            .map(|values| {
                values
                    .into_iter()
                    .map(|value| downcast_value(&id, value))
                    .collect()
            })
            .transpose()
    }

    /// Typed values of the multi-group `id`; `default` on a miss
    pub fn get_many_or_default<T: Any + Send + Sync>(
        &self,
        id: impl Into<ServiceId>,
        default: Vec<Arc<T>>,
        recursive: bool,
    ) -> Result<Vec<Arc<T>>> {
        let id = id.into();
        match self.resolve_many_or_null(&id, recursive)? {
            Some(values) => values
                .into_iter()
                .map(|value| downcast_value(&id, value))
                .collect(),
            None => Ok(default),
        }
    }

    /// Masked ids of the nearest group named `id`; groups are never merged
    fn group_members(
        &self,
        id: &ServiceId,
        recursive: bool,
    ) -> Result<(IdentifierLocation, Option<Vec<ServiceId>>)> {
        self.ensure_live()?;
        let local = self.read_state()?.groups.get(id).cloned();
        if local.is_some() {
            return Ok((IdentifierLocation::Local, local));
        }
        if !recursive {
            return Ok((IdentifierLocation::None, None));
        }
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            let found = node.read_state()?.groups.get(id).cloned();
            if found.is_some() {
                return Ok((IdentifierLocation::Parent, found));
            }
            cursor = node.parent();
        }
        Ok((IdentifierLocation::None, None))
    }

    fn resolve_member(&self, member: &ServiceId) -> Result<ServiceValue> {
        self.fetch(member, true)?
            .1
            .ok_or_else(|| Error::not_found(member.to_string()))
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a service, compiling its declared dependencies
    ///
    /// Returns the public identifier. Singleton services are stored on the
    /// default node; `multiple` services are stored under a fresh masked id
    /// appended to the public id's group.
    pub fn set(&self, options: ServiceOptions) -> Result<ServiceId> {
        let dependencies = options
            .dependencies
            .iter()
            .cloned()
            .map(Dependency::compile)
            .collect();
        self.store(options, dependencies)
    }

    /// Register a service with already compiled dependencies
    ///
    /// Dependencies declared on `options` are ignored.
    pub fn set_precompiled(
        &self,
        options: ServiceOptions,
        dependencies: Vec<Resolvable>,
    ) -> Result<ServiceId> {
        self.store(options, dependencies)
    }

    /// Register a plain value under a name or token
    pub fn set_value<T: Any + Send + Sync>(
        &self,
        id: impl Into<ServiceId>,
        value: T,
    ) -> Result<ServiceId> {
        self.set_shared_value(id, Arc::new(value))
    }

    /// Register an already shared value under a name or token
    pub fn set_shared_value(&self, id: impl Into<ServiceId>, value: ServiceValue) -> Result<ServiceId> {
        self.ensure_live()?;
        let id = id.into();
        if !id.accepts_plain_value() {
            return Err(Error::invalid_usage(format!(
                "plain values can only be set under a name or token, got {id}"
            )));
        }
        self.store(ServiceOptions::new(id).shared_value(value), Vec::new())
    }

    fn store(&self, options: ServiceOptions, dependencies: Vec<Resolvable>) -> Result<ServiceId> {
        self.ensure_live()?;
        let public = options.id.clone();
        if public.is_virtual() {
            return Err(Error::invalid_usage(format!(
                "virtual identifier {public} cannot be set"
            )));
        }
        if public.is_masked() {
            return Err(Error::invalid_usage(format!(
                "masked identifier {public} is reserved for multi-groups"
            )));
        }
        if options.scope == Scope::Singleton && !self.is_default() {
            return Registry::default_registry().store(options, dependencies);
        }

        let multiple = options.multiple;
        let eager = options.eager && options.scope != Scope::Transient;
        let key = if multiple {
            ServiceId::from(MaskedId::mint())
        } else {
            public.clone()
        };
        let record = options.into_record(key.clone(), dependencies.into());

        {
            let mut state = self.write_state()?;
            state.records.insert(key.clone(), record.clone());
            if multiple {
                let mut members = state.groups.get(&public).cloned().unwrap_or_default();
                members.push(key.clone());
                state.groups.insert(public.clone(), members);
            }
        }

        debug!(
            target: REGISTRY_LOG_TARGET,
            registry = self.id(),
            id = %public,
            scope = %record.scope,
            multiple,
            eager,
            "Service registered"
        );
        self.inner
            .listeners
            .notify(|listener| listener.on_new_service(self, &record))?;

        if eager {
            self.resolve_with(&key, false)?;
        }
        Ok(public)
    }

    // ========================================================================
    // Removal and reset
    // ========================================================================

    /// Dispose the value of `id` and delete its record (or its whole group)
    ///
    /// Unknown identifiers are ignored.
    pub fn remove(&self, id: impl Into<ServiceId>) -> Result<()> {
        self.remove_many([id.into()])
    }

    /// [`Registry::remove`] for several identifiers
    pub fn remove_many<I, S>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        self.ensure_live()?;
        let evicted = {
            let mut state = self.write_state()?;
            let mut evicted = Vec::new();
            for id in ids {
                let id = id.into();
                if let Some(members) = state.groups.remove(&id) {
                    evicted.extend(members.iter().filter_map(|member| state.records.remove(member)));
                }
                if id.is_masked() {
                    state.detach_member(&id);
                }
                evicted.extend(state.records.remove(&id));
            }
            state.disposable(evicted)
        };
        for record in &evicted {
            self.dispose_value(record);
        }
        debug!(
            target: REGISTRY_LOG_TARGET,
            registry = self.id(),
            removed = evicted.len(),
            "Services removed"
        );
        Ok(())
    }

    /// Drop cached values, or every record with [`ResetStrategy::ResetServices`]
    ///
    /// `ResetValue` only touches records that can rebuild their value.
    pub fn reset(&self, strategy: ResetStrategy) -> Result<()> {
        self.ensure_live()?;
        self.reset_state(strategy)
    }

    fn reset_state(&self, strategy: ResetStrategy) -> Result<()> {
        let evicted = {
            let mut state = self.write_state()?;
            let evicted = match strategy {
                ResetStrategy::ResetValue => {
                    let cached: Vec<ServiceRecord> = state
                        .records
                        .iter()
                        .filter(|(_, record)| record.is_constructible() && record.has_value())
                        .map(|(_, record)| record.clone())
                        .collect();
                    for record in &cached {
                        state.records.update(&record.id, |stored| stored.value = None);
                    }
                    cached
                }
                ResetStrategy::ResetServices => {
                    let all: Vec<ServiceRecord> =
                        state.records.iter().map(|(_, record)| record.clone()).collect();
                    state.records.clear();
                    state.groups.clear();
                    all
                }
            };
            state.disposable(evicted)
        };
        for record in &evicted {
            self.dispose_value(record);
        }
        debug!(
            target: REGISTRY_LOG_TARGET,
            registry = self.id(),
            ?strategy,
            evicted = evicted.len(),
            "Registry reset"
        );
        Ok(())
    }

    fn dispose_value(&self, record: &ServiceRecord) {
        if let Err(e) = record.dispose_value() {
            warn!(
                target: REGISTRY_LOG_TARGET,
                registry = self.id(),
                id = %record.id,
                error = %e,
                "Dispose hook failed"
            );
        }
    }

    /// Tear the node down
    ///
    /// Clears every record, disposes listeners and leaves the directory.
    /// Afterwards every operation except node creation fails with
    /// `InvalidUsage`, including a second `dispose`.
    pub async fn dispose(&self) -> Result<()> {
        if self
            .inner
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::invalid_usage(format!(
                "registry '{}' is already disposed",
                self.inner.id
            )));
        }

        self.reset_state(ResetStrategy::ResetServices)?;
        if self.discard_snapshot()? {
            self.reset_state(ResetStrategy::ResetServices)?;
        }
        self.evict_forwarders(|_| true)?;
        for listener in self.inner.listeners.drain()? {
            if let Err(e) = listener.dispose().await {
                warn!(
                    target: REGISTRY_LOG_TARGET,
                    registry = self.id(),
                    error = %e,
                    "Listener dispose failed"
                );
            }
        }
        directory().release(self);

        debug!(target: REGISTRY_LOG_TARGET, registry = self.id(), "Registry disposed");
        Ok(())
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Local (record id, record) pairs in insertion order
    ///
    /// Multi-group members appear under their masked ids.
    pub fn entries(&self) -> Result<Vec<(ServiceId, ServiceRecord)>> {
        self.ensure_live()?;
        let state = self.read_state()?;
        Ok(state
            .records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect())
    }

    /// Number of local records
    pub fn len(&self) -> Result<usize> {
        self.ensure_live()?;
        Ok(self.read_state()?.records.len())
    }

    /// Whether no record is stored locally
    pub fn is_empty(&self) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.read_state()?.records.is_empty())
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Start buffering record changes; returns `false` if already staging
    pub fn begin_snapshot(&self) -> Result<bool> {
        self.ensure_live()?;
        let mut state = self.write_state()?;
        let started = state.records.begin();
        state.groups.begin();
        if started {
            debug!(target: REGISTRY_LOG_TARGET, registry = self.id(), "Snapshot started");
        }
        Ok(started)
    }

    /// Discard every change made since [`Registry::begin_snapshot`]
    ///
    /// Returns `false` if no snapshot was active.
    pub fn end_snapshot(&self) -> Result<bool> {
        self.ensure_live()?;
        self.discard_snapshot()
    }

    fn discard_snapshot(&self) -> Result<bool> {
        let ended = {
            let mut state = self.write_state()?;
            state.groups.end();
            state.records.end()
        };
        if ended {
            debug!(target: REGISTRY_LOG_TARGET, registry = self.id(), "Snapshot discarded");
        }
        Ok(ended)
    }

    /// Whether a snapshot is active
    pub fn in_snapshot(&self) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.read_state()?.records.is_staging())
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Attach `listener`; returns `false` when its `attach` hook declines
    ///
    /// An error from `attach` detaches the listener and is returned.
    pub fn accept_listener(&self, listener: SharedListener) -> Result<bool> {
        self.ensure_live()?;
        self.inner.listeners.push(Arc::clone(&listener))?;
        match listener.attach(self) {
            Ok(true) => {}
            Ok(false) => {
                self.inner.listeners.remove(&listener)?;
                return Ok(false);
            }
            Err(e) => {
                self.inner.listeners.remove(&listener)?;
                return Err(e);
            }
        }

        if listener.wants_orphan_events() && !self.is_default() {
            self.evict_forwarders(|target| target.is_disposed())?;
            let proxy: SharedListener = Arc::new(OrphanForwarder::new(Arc::clone(&listener)));
            Registry::default_registry()
                .inner
                .listeners
                .push(Arc::clone(&proxy))?;
            self.forwarders()?.push((listener, proxy));
        }
        Ok(true)
    }

    /// Detach `listener` and its orphan proxy; returns whether it was attached
    pub fn detach_listener(&self, listener: &SharedListener) -> Result<bool> {
        self.ensure_live()?;
        let removed = self.inner.listeners.remove(listener)?;
        self.evict_forwarders(|target| Arc::ptr_eq(target, listener))?;
        Ok(removed)
    }

    /// Whether `listener` is attached to this node
    pub fn has_listener(&self, listener: &SharedListener) -> Result<bool> {
        self.ensure_live()?;
        self.inner.listeners.contains(listener)
    }

    fn forwarders(&self) -> Result<MutexGuard<'_, Vec<Forwarder>>> {
        lock_mutex(&self.inner.forwarders, Guarded::Forwarders(&self.inner.id))
    }

    /// Drop the forwarders whose target matches `evict`, along with their
    /// proxies on the default node; returns how many were dropped
    fn evict_forwarders<F>(&self, evict: F) -> Result<usize>
    where
        F: Fn(&SharedListener) -> bool,
    {
        let evicted: Vec<Forwarder> = {
            let mut forwarders = self.forwarders()?;
            let (evicted, kept) = std::mem::take(&mut *forwarders)
                .into_iter()
                .partition(|(target, _)| evict(target));
            *forwarders = kept;
            evicted
        };
        let default = Registry::default_registry();
        for (_, proxy) in &evicted {
            default.inner.listeners.remove(proxy)?;
        }
        Ok(evicted.len())
    }

    pub(crate) fn notify<F>(&self, event: F) -> Result<()>
    where
        F: Fn(&dyn RegistryListener),
    {
        self.inner.listeners.notify(event)
    }

    fn notify_retrieval(&self, event: RetrievalEvent) -> Result<()> {
        trace!(
            target: REGISTRY_LOG_TARGET,
            registry = self.id(),
            id = %event.id,
            many = event.many,
            recursive = event.recursive,
            location = %event.location,
            "Service lookup"
        );
        self.inner
            .listeners
            .notify(|listener| listener.on_retrieval(self, &event))
    }
}

impl PartialEq for Registry {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Registry {}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = self
            .inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|parent| parent.id.clone());
        f.debug_struct("Registry")
            .field("id", &self.inner.id)
            .field("parent", &parent)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
