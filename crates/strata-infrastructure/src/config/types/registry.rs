//! Registry creation defaults
//!
//! Unset fields fall back to the built-in policy defaults, so an empty
//! `[registry]` table behaves exactly like no configuration at all.

use serde::{Deserialize, Serialize};
use strata_domain::value_objects::{ConflictDefinition, OnConflict, OnFree};

/// Default creation policies applied by `CreateOptions::from_settings`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Behavior when a requested node id already exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_conflict: Option<OnConflict>,

    /// Behavior when a requested node id does not exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_free: Option<OnFree>,

    /// What counts as a conflict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_definition: Option<ConflictDefinition>,
}
