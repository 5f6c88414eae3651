//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Strata registry
///
/// Variants describe the error *kind*; the message text is diagnostic only.
#[derive(Error, Debug)]
pub enum Error {
    /// Identifier could not be resolved anywhere in the reachable tree
    #[error("Service not found: {id}")]
    NotFound {
        /// Display form of the identifier that was looked up
        id: String,
    },

    /// Record has neither a usable factory nor a type, or construction produced nothing
    #[error("Cannot instantiate service {id}: {reason}")]
    CannotInstantiate {
        /// Display form of the identifier being materialized
        id: String,
        /// Why construction was impossible
        reason: String,
    },

    /// A built-in type was requested without a factory to hand-construct it
    #[error("Cannot instantiate built-in type {id} without a factory")]
    CannotInstantiateBuiltIn {
        /// Display form of the built-in type identifier
        id: String,
    },

    /// Duplicate registry id, unknown registry id, or a `Throw` creation policy
    #[error("Registry conflict: {message}")]
    RegistryConflict {
        /// Description of the conflict
        message: String,
    },

    /// Programmer error with no recovery path
    #[error("Invalid usage: {message}")]
    InvalidUsage {
        /// Description of the misuse
        message: String,
    },

    /// A resolved value did not have the requested Rust type
    #[error("Service {id} is not of type {expected}")]
    TypeMismatch {
        /// Display form of the identifier
        id: String,
        /// Name of the requested type
        expected: &'static str,
    },

    /// Error raised by a user-supplied factory or hook
    #[error("Service error: {message}")]
    Service {
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

// Resolution error creation methods
impl Error {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a cannot-instantiate error
    pub fn cannot_instantiate<S: Into<String>, R: Into<String>>(id: S, reason: R) -> Self {
        Self::CannotInstantiate {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a cannot-instantiate-built-in error
    pub fn cannot_instantiate_builtin<S: Into<String>>(id: S) -> Self {
        Self::CannotInstantiateBuiltIn { id: id.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch<S: Into<String>>(id: S, expected: &'static str) -> Self {
        Self::TypeMismatch {
            id: id.into(),
            expected,
        }
    }
}

// Usage error creation methods
impl Error {
    /// Create a registry conflict error
    pub fn registry_conflict<S: Into<String>>(message: S) -> Self {
        Self::RegistryConflict {
            message: message.into(),
        }
    }

    /// Create an invalid usage error
    pub fn invalid_usage<S: Into<String>>(message: S) -> Self {
        Self::InvalidUsage {
            message: message.into(),
        }
    }
}

// Service and infrastructure error creation methods
impl Error {
    /// Create a service error
    pub fn service<S: Into<String>>(message: S) -> Self {
        Self::Service {
            message: message.into(),
            source: None,
        }
    }

    /// Create a service error with source
    pub fn service_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Service {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// Inspectors
impl Error {
    /// Whether this is a [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is a [`Error::InvalidUsage`]
    pub fn is_invalid_usage(&self) -> bool {
        matches!(self, Self::InvalidUsage { .. })
    }

    /// Whether this is a [`Error::RegistryConflict`]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::RegistryConflict { .. })
    }

    /// Whether this is either instantiation failure kind
    pub fn is_instantiation(&self) -> bool {
        matches!(
            self,
            Self::CannotInstantiate { .. } | Self::CannotInstantiateBuiltIn { .. }
        )
    }
}
