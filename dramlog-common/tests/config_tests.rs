//! Integration tests for configuration loading
//!
//! Tests cover:
//! - Missing config files fall back to defaults
//! - Platform config location discovery
//! - Priority order of overrides, TOML values and defaults
//!
//! Tests that modify XDG_CONFIG_HOME are marked `#[serial]` so they do not
//! race each other.

use dramlog_common::config::{
    default_database_path, load_toml_config, parse_toml_config, Config, ConfigOverrides,
    DEFAULT_BIND, DEFAULT_PORT,
};
use dramlog_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_default_database_path_is_named_dramlog() {
    let path = default_database_path();
    assert_eq!(path.file_name().unwrap(), "dramlog.db");
    assert_eq!(path.parent().unwrap().file_name().unwrap(), "dramlog");
}

#[test]
fn test_explicit_config_overrides_and_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dramlog.toml");
    std::fs::write(
        &path,
        "database_path = \"/srv/dramlog.db\"\nport = 6000\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let toml_config = load_toml_config(Some(&path)).unwrap();
    let config = Config::resolve(
        toml_config,
        ConfigOverrides {
            port: Some(6001),
            ..Default::default()
        },
    );

    // override beats TOML, TOML beats defaults
    assert_eq!(config.port, 6001);
    assert_eq!(config.database_path, PathBuf::from("/srv/dramlog.db"));
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.bind, DEFAULT_BIND);
    assert_eq!(config.event_capacity, 1000);
}

#[test]
fn test_unparseable_config_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dramlog.toml");
    std::fs::write(&path, "port = [").unwrap();

    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_unknown_sections_are_ignored() {
    let config = parse_toml_config("[something_else]\nkey = 1\n").unwrap();
    assert!(config.port.is_none());
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let original = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let result = load_toml_config(None);

    match original {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    // Only meaningful when no system-wide config is installed
    if !std::path::Path::new("/etc/dramlog/config.toml").exists() {
        let config = Config::resolve(result.unwrap(), ConfigOverrides::default());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_level, "info");
    }
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_user_config_file_discovered() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("dramlog");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "port = 7123\n").unwrap();

    let original = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let result = load_toml_config(None);

    match original {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(result.unwrap().port, Some(7123));
}
