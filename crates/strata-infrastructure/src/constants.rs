//! Infrastructure layer constants
//!
//! Contains constants that are part of the infrastructure implementation.
//! Registry-semantics constants are defined in `strata_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "strata.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "strata";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "STRATA";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable that overrides the log filter
pub const LOG_FILTER_ENV: &str = "STRATA_LOG";

/// `tracing` target used by the registry engine
pub const REGISTRY_LOG_TARGET: &str = "strata::registry";
