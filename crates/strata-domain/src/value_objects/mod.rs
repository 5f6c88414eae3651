//! Domain Value Objects
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`ServiceId`] | Key a record is stored and resolved under |
//! | [`Token`] | Opaque, optionally named identifier |
//! | [`Scope`] | Caching policy of a record |
//! | [`Constraints`] | Lookup-policy bitmask for dependencies |
//! | [`OnConflict`] / [`OnFree`] / [`ConflictDefinition`] | Node creation policies |

/// Resolution constraint bitmask
pub mod constraints;
/// Service identifiers and tokens
pub mod identifier;
/// Node creation policies
pub mod policy;
/// Scopes, presence filters and reset strategies
pub mod scope;

pub use constraints::Constraints;
pub use identifier::{MaskedId, ServiceId, Token, TypeTag, VirtualId};
pub use policy::{ConflictDefinition, OnConflict, OnFree};
pub use scope::{ResetStrategy, Scope, ScopeFilter};
