use std::fmt;

use crate::value_objects::ServiceId;

/// Where an identifier was found relative to the node performing a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierLocation {
    /// Present in the node itself
    Local,
    /// Absent locally, present somewhere in the ancestor chain
    Parent,
    /// Not reachable
    None,
}

impl fmt::Display for IdentifierLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Parent => "parent",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// A completed lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalEvent {
    /// Identifier that was looked up
    pub id: ServiceId,
    /// Whether the multi-group lookup was used
    pub many: bool,
    /// Whether the lookup was allowed to ascend
    pub recursive: bool,
    /// Where the identifier was found
    pub location: IdentifierLocation,
}

impl RetrievalEvent {
    /// Event for a single-value lookup
    pub fn single(id: ServiceId, recursive: bool, location: IdentifierLocation) -> Self {
        Self {
            id,
            many: false,
            recursive,
            location,
        }
    }

    /// Event for a multi-group lookup
    pub fn many(id: ServiceId, recursive: bool, location: IdentifierLocation) -> Self {
        Self {
            id,
            many: true,
            recursive,
            location,
        }
    }

    /// Whether the lookup found anything
    pub fn is_hit(&self) -> bool {
        self.location != IdentifierLocation::None
    }
}
