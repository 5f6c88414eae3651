//! Listener fan-out
//!
//! Every registry node owns a [`ListenerCollection`] and broadcasts its
//! lifecycle events through it: new child nodes, new orphan nodes, new
//! records, completed lookups and disposal.
//!
//! Orphan events are only ever emitted by the default node. A listener that
//! wants them but is attached to another node is represented on the default
//! node by an [`OrphanForwarder`] proxy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use strata_domain::error::Result;
use strata_domain::events::RetrievalEvent;
use tracing::debug;

use super::record::ServiceRecord;
use super::registry::Registry;
use crate::constants::REGISTRY_LOG_TARGET;
use crate::locks::{Guarded, lock_mutex};

/// Observer of registry lifecycle events
///
/// Every hook has a no-op default. Hooks are called without any registry
/// lock held, so they may freely call back into the registry.
#[async_trait]
pub trait RegistryListener: Send + Sync {
    /// Called when the listener is added to `registry`
    ///
    /// Returning `Ok(false)` or an error detaches the listener again.
    fn attach(&self, _registry: &Registry) -> Result<bool> {
        Ok(true)
    }

    /// Whether the listener wants orphan-node events
    fn wants_orphan_events(&self) -> bool {
        false
    }

    /// Whether the listener has been disposed; disposed listeners are pruned
    fn is_disposed(&self) -> bool {
        false
    }

    /// A child node was created under `parent`
    fn on_child_registry(&self, _parent: &Registry, _child: &Registry) {}

    /// A node without an explicit parent was created
    fn on_orphaned_registry(&self, _registry: &Registry) {}

    /// A record was stored on `registry`
    fn on_new_service(&self, _registry: &Registry, _record: &ServiceRecord) {}

    /// A lookup on `registry` completed
    fn on_retrieval(&self, _registry: &Registry, _event: &RetrievalEvent) {}

    /// Release the listener; called when the owning node is disposed
    async fn dispose(&self) -> Result<()> {
        Ok(())
    }
}

/// Shared listener handle
pub type SharedListener = Arc<dyn RegistryListener>;

// ============================================================================
// Collection
// ============================================================================

/// Ordered set of listeners attached to one node
#[derive(Default)]
pub struct ListenerCollection {
    listeners: Mutex<Vec<SharedListener>>,
}

impl ListenerCollection {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener`
    pub fn push(&self, listener: SharedListener) -> Result<()> {
        lock_mutex(&self.listeners, Guarded::Listeners)?.push(listener);
        Ok(())
    }

    /// Remove `listener`; returns whether it was present
    pub fn remove(&self, listener: &SharedListener) -> Result<bool> {
        let mut listeners = lock_mutex(&self.listeners, Guarded::Listeners)?;
        let before = listeners.len();
        listeners.retain(|candidate| !Arc::ptr_eq(candidate, listener));
        Ok(listeners.len() != before)
    }

    /// Whether `listener` is attached
    pub fn contains(&self, listener: &SharedListener) -> Result<bool> {
        let listeners = lock_mutex(&self.listeners, Guarded::Listeners)?;
        Ok(listeners
            .iter()
            .any(|candidate| Arc::ptr_eq(candidate, listener)))
    }

    /// Currently attached listeners
    pub fn snapshot(&self) -> Result<Vec<SharedListener>> {
        Ok(lock_mutex(&self.listeners, Guarded::Listeners)?.clone())
    }

    /// Number of attached listeners
    pub fn len(&self) -> usize {
        lock_mutex(&self.listeners, Guarded::Listeners)
            .map(|listeners| listeners.len())
            .unwrap_or_default()
    }

    /// Whether no listener is attached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `event` on every live listener, pruning disposed ones
    pub fn notify<F>(&self, event: F) -> Result<()>
    where
        F: Fn(&dyn RegistryListener),
    {
        let live = {
            let mut listeners = lock_mutex(&self.listeners, Guarded::Listeners)?;
            listeners.retain(|listener| !listener.is_disposed());
            listeners.clone()
        };
        for listener in &live {
            event(listener.as_ref());
        }
        Ok(())
    }

    /// Detach and return every listener
    pub fn drain(&self) -> Result<Vec<SharedListener>> {
        let mut listeners = lock_mutex(&self.listeners, Guarded::Listeners)?;
        Ok(std::mem::take(&mut *listeners))
    }
}

impl std::fmt::Debug for ListenerCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerCollection")
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Orphan Forwarding
// ============================================================================

/// Proxy placed on the default node that relays orphan events to a listener
/// attached elsewhere
pub struct OrphanForwarder {
    target: SharedListener,
}

impl OrphanForwarder {
    /// Relay orphan events to `target`
    pub fn new(target: SharedListener) -> Self {
        Self { target }
    }

    /// Listener the proxy relays to
    pub fn target(&self) -> &SharedListener {
        &self.target
    }
}

#[async_trait]
impl RegistryListener for OrphanForwarder {
    fn is_disposed(&self) -> bool {
        self.target.is_disposed()
    }

    fn on_orphaned_registry(&self, registry: &Registry) {
        self.target.on_orphaned_registry(registry);
    }
}

// ============================================================================
// Tracing Listener
// ============================================================================

/// Listener logging every event through `tracing`
///
/// Events are emitted at `debug` level under the `strata::registry` target.
#[derive(Debug, Default)]
pub struct TracingListener {
    disposed: AtomicBool,
}

impl TracingListener {
    /// Create a new tracing listener
    pub fn new() -> Self {
        Self::default()
    }

    /// Create as Arc for sharing
    pub fn new_shared() -> SharedListener {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl RegistryListener for TracingListener {
    fn attach(&self, registry: &Registry) -> Result<bool> {
        debug!(target: REGISTRY_LOG_TARGET, registry = registry.id(), "Listener attached");
        Ok(true)
    }

    fn wants_orphan_events(&self) -> bool {
        true
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn on_child_registry(&self, parent: &Registry, child: &Registry) {
        debug!(
            target: REGISTRY_LOG_TARGET,
            parent = parent.id(),
            child = child.id(),
            "Child registry created"
        );
    }

    fn on_orphaned_registry(&self, registry: &Registry) {
        debug!(target: REGISTRY_LOG_TARGET, registry = registry.id(), "Orphan registry created");
    }

    fn on_new_service(&self, registry: &Registry, record: &ServiceRecord) {
        debug!(
            target: REGISTRY_LOG_TARGET,
            registry = registry.id(),
            id = %record.id(),
            scope = %record.scope(),
            "Service registered"
        );
    }

    fn on_retrieval(&self, registry: &Registry, event: &RetrievalEvent) {
        debug!(
            target: REGISTRY_LOG_TARGET,
            registry = registry.id(),
            id = %event.id,
            many = event.many,
            recursive = event.recursive,
            location = %event.location,
            "Service retrieved"
        );
    }

    async fn dispose(&self) -> Result<()> {
        self.disposed.store(true, Ordering::Release);
        Ok(())
    }
}
