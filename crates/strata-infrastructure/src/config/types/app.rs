//! Main application configuration

use serde::{Deserialize, Serialize};

use super::{LoggingConfig, RegistrySettings};

/// Root configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Registry creation defaults
    #[serde(default)]
    pub registry: RegistrySettings,
}
