//! Registry Events
//!
//! Immutable facts broadcast to registry listeners.
//!
//! | Event | Description |
//! |-------|-------------|
//! | [`RetrievalEvent`] | A lookup completed, with where the identifier was found |
//! | [`IdentifierLocation`] | Where in the node tree an identifier lives |

/// Retrieval event definitions
pub mod retrieval;

pub use retrieval::{IdentifierLocation, RetrievalEvent};
