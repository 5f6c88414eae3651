//! Unit tests for domain error types

use std::error::Error as _;

use strata_domain::Error;

#[test]
fn test_not_found_error() {
    let error = Error::not_found("logger");
    match &error {
        Error::NotFound { id } => assert_eq!(id, "logger"),
        _ => panic!("Expected NotFound error"),
    }
    assert!(error.is_not_found());
    assert!(!error.is_invalid_usage());
}

#[test]
fn test_cannot_instantiate_error() {
    let error = Error::cannot_instantiate("cache", "no factory");
    match &error {
        Error::CannotInstantiate { id, reason } => {
            assert_eq!(id, "cache");
            assert_eq!(reason, "no factory");
        }
        _ => panic!("Expected CannotInstantiate error"),
    }
    assert!(error.is_instantiation());
}

#[test]
fn test_cannot_instantiate_builtin_error() {
    let error = Error::cannot_instantiate_builtin("alloc::string::String");
    assert!(matches!(error, Error::CannotInstantiateBuiltIn { .. }));
    assert!(error.is_instantiation());
    assert!(error.to_string().contains("alloc::string::String"));
}

#[test]
fn test_registry_conflict_error() {
    let error = Error::registry_conflict("registry 'app' already exists");
    match &error {
        Error::RegistryConflict { message } => assert!(message.contains("app")),
        _ => panic!("Expected RegistryConflict error"),
    }
    assert!(error.is_conflict());
}

#[test]
fn test_invalid_usage_error() {
    let error = Error::invalid_usage("disposed");
    assert!(error.is_invalid_usage());
    assert!(!error.is_conflict());
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::type_mismatch("port", "u16");
    match error {
        Error::TypeMismatch { id, expected } => {
            assert_eq!(id, "port");
            assert_eq!(expected, "u16");
        }
        _ => panic!("Expected TypeMismatch error"),
    }
}

#[test]
fn test_service_error_keeps_source() {
    let io = std::io::Error::other("disk full");
    let error = Error::service_with_source("flush failed", io);
    assert!(error.source().is_some());
    assert!(Error::service("plain").source().is_none());
}

#[test]
fn test_configuration_error_display() {
    let error = Error::configuration("Invalid log level");
    assert_eq!(error.to_string(), "Configuration error: Invalid log level");
}

#[test]
fn test_internal_error() {
    let error = Error::internal("lock poisoned");
    match error {
        Error::Internal { message } => assert_eq!(message, "lock poisoned"),
        _ => panic!("Expected Internal error"),
    }
}
