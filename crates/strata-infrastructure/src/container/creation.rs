//! Node creation and the default node
//!
//! Every node is created through [`Registry::of_with`] (or one of its
//! shorthands), which consults the directory and applies the creation
//! policies in [`CreateOptions`] when the requested id is already taken or
//! still free.

use once_cell::sync::Lazy;
use strata_domain::constants::DEFAULT_REGISTRY_ID;
use strata_domain::error::{Error, Result};
use strata_domain::value_objects::{ConflictDefinition, OnConflict, OnFree};
use tracing::{debug, warn};

use super::directory::directory;
use super::registry::Registry;
use crate::config::RegistrySettings;
use crate::constants::REGISTRY_LOG_TARGET;

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let node = Registry::new_node(DEFAULT_REGISTRY_ID, None);
    if let Err(e) = directory().register(node.clone()) {
        warn!(target: REGISTRY_LOG_TARGET, error = %e, "Default registry not tracked by the directory");
    }
    node
});

/// Policies applied by [`Registry::of_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Behavior when the id is taken; see [`CreateOptions::effective_on_conflict`]
    pub on_conflict: Option<OnConflict>,
    /// Behavior when the id is free; defaults to [`OnFree::ReturnNew`]
    pub on_free: Option<OnFree>,
    /// What counts as a conflict; defaults to [`ConflictDefinition::RejectAll`]
    pub conflict_definition: Option<ConflictDefinition>,
}

impl CreateOptions {
    /// Options with every policy at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the policies from configuration
    pub fn from_settings(settings: &RegistrySettings) -> Self {
        Self {
            on_conflict: settings.on_conflict,
            on_free: settings.on_free,
            conflict_definition: settings.conflict_definition,
        }
    }

    /// Set the conflict behavior
    pub fn with_on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }

    /// Set the free-id behavior
    pub fn with_on_free(mut self, on_free: OnFree) -> Self {
        self.on_free = Some(on_free);
        self
    }

    /// Set what counts as a conflict
    pub fn with_conflict_definition(mut self, definition: ConflictDefinition) -> Self {
        self.conflict_definition = Some(definition);
        self
    }

    /// Conflict behavior in force
    ///
    /// `ReturnExisting` unless a conflict definition was given, then `Throw`.
    pub fn effective_on_conflict(&self) -> OnConflict {
        self.on_conflict.unwrap_or(if self.conflict_definition.is_some() {
            OnConflict::Throw
        } else {
            OnConflict::ReturnExisting
        })
    }
}

impl Registry {
    /// The process-wide default node
    ///
    /// Parentless; singleton services are stored here.
    pub fn default_registry() -> Registry {
        DEFAULT_REGISTRY.clone()
    }

    /// Fetch or create the node `id` under the default node
    pub fn of(id: &str) -> Result<Registry> {
        let default = Registry::default_registry();
        Registry::of_with(id, Some(&default), CreateOptions::default())?.ok_or_else(|| {
            Error::registry_conflict(format!("registry '{id}' could not be created"))
        })
    }

    /// Fetch or create the node `id` under `parent`, or as an orphan for `None`
    ///
    /// `"default"` always yields the default node. Returns `None` when the
    /// applicable policy is `Null`.
    pub fn of_with(
        id: &str,
        parent: Option<&Registry>,
        options: CreateOptions,
    ) -> Result<Option<Registry>> {
        if id == DEFAULT_REGISTRY_ID {
            return Ok(Some(Registry::default_registry()));
        }
        if let Some(parent) = parent {
            parent.ensure_live()?;
        }

        if let Some(existing) = directory().find(id) {
            let conflicting = match options.conflict_definition.unwrap_or_default() {
                ConflictDefinition::RejectAll => true,
                ConflictDefinition::AllowSameParent => !same_parent(&existing, parent),
            };
            if !conflicting {
                return Ok(Some(existing));
            }
            return match options.effective_on_conflict() {
                OnConflict::Throw => Err(Error::registry_conflict(format!(
                    "registry '{id}' already exists"
                ))),
                OnConflict::Null => Ok(None),
                OnConflict::ReturnExisting => Ok(Some(existing)),
            };
        }

        match options.on_free.unwrap_or_default() {
            OnFree::Throw => Err(Error::registry_conflict(format!(
                "registry '{id}' does not exist"
            ))),
            OnFree::Null => Ok(None),
            OnFree::ReturnNew => Registry::create(id, parent).map(Some),
        }
    }

    fn create(id: &str, parent: Option<&Registry>) -> Result<Registry> {
        let node = Registry::new_node(id, parent);
        directory().register(node.clone())?;
        debug!(
            target: REGISTRY_LOG_TARGET,
            registry = id,
            parent = parent.map(Registry::id),
            "Registry created"
        );

        match parent {
            Some(parent) => parent.notify(|listener| listener.on_child_registry(parent, &node))?,
            None => Registry::default_registry()
                .notify(|listener| listener.on_orphaned_registry(&node))?,
        }
        Ok(node)
    }

    /// Fetch or create the node `id` under the default node
    ///
    /// Instance form of [`Registry::of_with`]; fails once this node is disposed.
    pub fn of_root(&self, id: &str, options: CreateOptions) -> Result<Option<Registry>> {
        self.ensure_live()?;
        let default = Registry::default_registry();
        Registry::of_with(id, Some(&default), options)
    }

    /// Fetch or create the node `id` with this node as parent
    pub fn of_child(&self, id: &str, options: CreateOptions) -> Result<Option<Registry>> {
        self.ensure_live()?;
        Registry::of_with(id, Some(self), options)
    }

    /// Fetch or create the child `id` with default policies
    pub fn child(&self, id: &str) -> Result<Registry> {
        self.of_child(id, CreateOptions::default())?.ok_or_else(|| {
            Error::registry_conflict(format!("registry '{id}' could not be created"))
        })
    }
}

fn same_parent(existing: &Registry, parent: Option<&Registry>) -> bool {
    match (existing.parent(), parent) {
        (Some(current), Some(requested)) => current.ptr_eq(requested),
        (None, None) => true,
        _ => false,
    }
}
