//! # Domain Layer
//!
//! Pure types shared by the Strata registry engine and its callers: error
//! kinds, service identifiers, scopes, the constraint bitmask, creation
//! policies and retrieval events. No I/O and no global state beyond the
//! counters that mint tokens and masked identifiers.

pub mod constants;
pub mod error;
pub mod events;
pub mod value_objects;

pub use error::{Error, Result};
pub use events::{IdentifierLocation, RetrievalEvent};
pub use value_objects::{
    ConflictDefinition, Constraints, MaskedId, OnConflict, OnFree, ResetStrategy, Scope,
    ScopeFilter, ServiceId, Token, TypeTag, VirtualId,
};
