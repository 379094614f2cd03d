//! Tests for client configuration loading.

use std::io::Write;

use tempfile::NamedTempFile;

use caity_client::{BuildProfile, ClientConfig};

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_defaults() {
    let config = ClientConfig::default();
    assert_eq!(*config.build(), BuildProfile::Development);
    assert_eq!(*config.starting_coins(), 500);
    assert!(config.should_seed_test_user());
}

#[test]
fn test_from_file_partial_uses_defaults() {
    let file = config_file("build = \"production\"\nstarting_coins = 42\n");
    let config = ClientConfig::from_file(file.path()).expect("Load failed");
    assert_eq!(*config.build(), BuildProfile::Production);
    assert_eq!(*config.starting_coins(), 42);
    assert_eq!(config.test_user_email(), "test@caity.dev");
}

#[test]
fn test_production_never_seeds_test_user() {
    let file = config_file("build = \"production\"\nseed_test_user = true\n");
    let config = ClientConfig::from_file(file.path()).expect("Load failed");
    assert!(!config.should_seed_test_user());
}

#[test]
fn test_invalid_toml_is_an_error() {
    let file = config_file("starting_coins = \"lots\"\n");
    assert!(ClientConfig::from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(ClientConfig::from_file("/nonexistent/caity.toml").is_err());
}

#[test]
fn test_env_override_switches_build() {
    let config = ClientConfig::default()
        .with_env_override(Some("production"))
        .expect("Override failed");
    assert_eq!(*config.build(), BuildProfile::Production);
}

#[test]
fn test_env_override_absent_keeps_build() {
    let config = ClientConfig::default()
        .with_build(BuildProfile::Production)
        .with_env_override(None)
        .expect("Override failed");
    assert_eq!(*config.build(), BuildProfile::Production);
}

#[test]
fn test_env_override_rejects_unknown_value() {
    let err = ClientConfig::default()
        .with_env_override(Some("staging"))
        .expect_err("Expected invalid override to fail");
    assert!(err.to_string().contains("staging"));
}
