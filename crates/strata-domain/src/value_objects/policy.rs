//! Registry creation policies
//!
//! Together these decide what "create or fetch node by id" does when a node
//! with that id already exists, or does not.

use serde::{Deserialize, Serialize};

/// Behavior when a node with the requested id already exists and conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnConflict {
    /// Fail with a registry conflict
    Throw,
    /// Return no node
    Null,
    /// Return the existing node
    ReturnExisting,
}

/// Behavior when no node with the requested id exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFree {
    /// Fail with a registry conflict
    Throw,
    /// Return no node
    Null,
    /// Create and return a new node
    #[default]
    ReturnNew,
}

/// What counts as a conflict when a node with the requested id exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDefinition {
    /// Any existing node conflicts
    #[default]
    RejectAll,
    /// An existing node with the same parent is a hit, not a conflict
    AllowSameParent,
}
