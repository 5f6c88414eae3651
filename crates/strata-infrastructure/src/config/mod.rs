//! Configuration
//!
//! Layered configuration (defaults, TOML file, environment) loaded with
//! figment into [`AppConfig`].

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, LoggingConfig, RegistrySettings};
