//! Domain layer constants
//!
//! Constants that are part of the registry semantics. Infrastructure-specific
//! constants (config file names, env prefixes) live in the infrastructure crate.

// ============================================================================
// REGISTRY CONSTANTS
// ============================================================================

/// Id of the distinguished default registry node
pub const DEFAULT_REGISTRY_ID: &str = "default";

/// Display prefix of masked identifiers minted for multi-groups
pub const MASKED_ID_PREFIX: &str = "masked";

/// Display name of the host-container virtual identifier
pub const HOST_CONTAINER_NAME: &str = "HostContainer";
