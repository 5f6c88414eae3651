//! # Infrastructure Layer
//!
//! The registry engine plus the cross-cutting concerns around it.
//!
//! ## Module Categories
//!
//! ### Registry
//! | Module | Description |
//! |--------|-------------|
//! | [`container`] | Registry nodes, resolution, listeners, snapshots, directory |
//!
//! ### Configuration
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Layered TOML/environment configuration with figment |
//! | [`constants`] | Centralized infrastructure constants |
//!
//! ### Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`logging`] | Structured logging with tracing |
//!
//! ### Support
//! | Module | Description |
//! |--------|-------------|
//! | [`error_ext`] | Context helpers lifting foreign errors into the domain error |
//! | [`locks`] | Poison-aware lock helpers |

pub mod config;
pub mod constants;
pub mod container;
pub mod error_ext;
pub mod locks;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, ConfigLoader};
pub use container::{CreateOptions, Dependency, Registry, ServiceOptions};
pub use error_ext::ErrorContext;
