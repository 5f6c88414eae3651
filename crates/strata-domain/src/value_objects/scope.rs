//! Scopes, presence filters and reset strategies

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caching and sharing policy of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// One instance process-wide, stored on the default node
    Singleton,
    /// One instance per registry node
    #[default]
    Container,
    /// A new instance on every resolution
    Transient,
}

impl Scope {
    /// Whether materialized values are cached in the record
    pub fn caches_value(self) -> bool {
        !matches!(self, Self::Transient)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Singleton => "singleton",
            Self::Container => "container",
            Self::Transient => "transient",
        };
        f.write_str(name)
    }
}

/// Which kind of entry a presence check looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeFilter {
    /// Either a single record or a multi-group
    #[default]
    Any,
    /// Only single records
    Single,
    /// Only multi-groups
    Many,
}

impl ScopeFilter {
    /// Whether single records satisfy this filter
    pub fn includes_single(self) -> bool {
        matches!(self, Self::Any | Self::Single)
    }

    /// Whether multi-groups satisfy this filter
    pub fn includes_many(self) -> bool {
        matches!(self, Self::Any | Self::Many)
    }
}

/// How much state `reset` throws away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetStrategy {
    /// Dispose cached values but keep every record
    #[default]
    ResetValue,
    /// Dispose cached values and drop every record and multi-group
    ResetServices,
}
