//! Configuration Loader Tests

use strata_domain::{ConflictDefinition, Error, OnConflict, OnFree};
use strata_infrastructure::config::{AppConfig, ConfigLoader, RegistrySettings};
use strata_infrastructure::constants::DEFAULT_LOG_LEVEL;
use strata_infrastructure::container::CreateOptions;
use tempfile::TempDir;

#[test]
fn test_config_loader_default() {
    let config = ConfigLoader::new().load().unwrap();

    assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    assert_eq!(config.registry, RegistrySettings::default());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new().with_config_path(temp_dir.path().join("absent.toml"));

    let config = loader.load().unwrap();
    assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    assert!(loader.config_path().is_some());
}

#[test]
fn test_config_save_load() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("strata.toml");

    let mut original = AppConfig::default();
    original.logging.level = "debug".to_string();
    original.registry.on_conflict = Some(OnConflict::Throw);
    original.registry.conflict_definition = Some(ConflictDefinition::AllowSameParent);

    let loader = ConfigLoader::new();
    loader.save_to_file(&original, &config_path).unwrap();

    let loaded = ConfigLoader::new()
        .with_config_path(&config_path)
        .load()
        .unwrap();

    assert_eq!(loaded.logging.level, "debug");
    assert_eq!(loaded.registry, original.registry);
}

#[test]
fn test_partial_registry_table() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("strata.toml");
    std::fs::write(&config_path, "[registry]\non_free = \"null\"\n").unwrap();

    let config = ConfigLoader::new()
        .with_config_path(&config_path)
        .load()
        .unwrap();

    assert_eq!(config.registry.on_free, Some(OnFree::Null));
    assert_eq!(config.registry.on_conflict, None);

    let options = CreateOptions::from_settings(&config.registry);
    assert_eq!(options.on_free, Some(OnFree::Null));
    assert_eq!(options.effective_on_conflict(), OnConflict::ReturnExisting);
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("strata.toml");
    std::fs::write(&config_path, "[logging]\nlevel = \"chatty\"\n").unwrap();

    let error = ConfigLoader::new()
        .with_config_path(&config_path)
        .load()
        .unwrap_err();
    assert!(matches!(error, Error::Configuration { .. }));
}

#[test]
fn test_unknown_policy_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("strata.toml");
    std::fs::write(&config_path, "[registry]\non_conflict = \"explode\"\n").unwrap();

    let result = ConfigLoader::new().with_config_path(&config_path).load();
    assert!(matches!(result, Err(Error::Configuration { .. })));
}
