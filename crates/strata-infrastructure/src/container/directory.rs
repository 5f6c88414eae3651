//! Registry directory
//!
//! Process-wide map from node id to node. Every node created through
//! [`Registry::of_with`] is registered here, and the directory is what keeps
//! nodes alive: children only hold weak handles to their parents.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::Lazy;
use strata_domain::error::{Error, Result};
use tracing::debug;

use super::registry::Registry;
use crate::constants::REGISTRY_LOG_TARGET;

static DIRECTORY: Lazy<RegistryDirectory> = Lazy::new(RegistryDirectory::new);

/// The process-wide directory
pub fn directory() -> &'static RegistryDirectory {
    RegistryDirectory::global()
}

/// Thread-safe node directory using `DashMap`
#[derive(Debug, Default)]
pub struct RegistryDirectory {
    nodes: DashMap<String, Registry>,
}

impl RegistryDirectory {
    fn new() -> Self {
        Self::default()
    }

    /// The process-wide directory
    pub fn global() -> &'static RegistryDirectory {
        &DIRECTORY
    }

    /// Track `node` under its id
    pub fn register(&self, node: Registry) -> Result<()> {
        if node.is_disposed() {
            return Err(Error::invalid_usage(format!(
                "registry '{}' is disposed and cannot be registered",
                node.id()
            )));
        }
        match self.nodes.entry(node.id().to_string()) {
            Entry::Occupied(_) => Err(Error::registry_conflict(format!(
                "registry '{}' is already registered",
                node.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(node);
                Ok(())
            }
        }
    }

    /// Node registered under `id`
    pub fn get(&self, id: &str) -> Result<Registry> {
        self.find(id)
            .ok_or_else(|| Error::registry_conflict(format!("registry '{id}' is not registered")))
    }

    /// Node registered under `id`, if any
    pub fn find(&self, id: &str) -> Option<Registry> {
        self.nodes.get(id).map(|entry| entry.value().clone())
    }

    /// Whether a node is registered under `id`
    pub fn has(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Ids of every registered node, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node is registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Untrack `id` and dispose the node unless it already is
    ///
    /// The entry is gone before disposal completes, so lookups for `id` fail
    /// immediately.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let (_, node) = self
            .nodes
            .remove(id)
            .ok_or_else(|| Error::registry_conflict(format!("registry '{id}' is not registered")))?;
        debug!(target: REGISTRY_LOG_TARGET, registry = id, "Registry removed from directory");
        if node.is_disposed() {
            return Ok(());
        }
        node.dispose().await
    }

    /// Untrack `node` if it is the one registered under its id
    pub(crate) fn release(&self, node: &Registry) {
        self.nodes
            .remove_if(node.id(), |_, tracked| tracked.ptr_eq(node));
    }
}
