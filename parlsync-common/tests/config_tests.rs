//! Configuration resolution tests
//!
//! Note: tests that manipulate PARLSYNC_* environment variables are marked
//! #[serial] so they never race each other.

use parlsync_common::config::{
    resolve_database_path, resolve_dump_path, TomlConfig,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

#[test]
#[serial]
fn test_env_var_beats_config_file_for_database_path() {
    env::set_var("PARLSYNC_DATABASE", "/tmp/from-env.db");

    let config = TomlConfig {
        database_path: Some("/tmp/from-config.db".to_string()),
        ..Default::default()
    };
    assert_eq!(
        resolve_database_path(&config),
        PathBuf::from("/tmp/from-env.db")
    );

    env::remove_var("PARLSYNC_DATABASE");
}

#[test]
#[serial]
fn test_config_file_database_path_used_without_env() {
    env::remove_var("PARLSYNC_DATABASE");

    let config = TomlConfig {
        database_path: Some("/tmp/from-config.db".to_string()),
        ..Default::default()
    };
    assert_eq!(
        resolve_database_path(&config),
        PathBuf::from("/tmp/from-config.db")
    );
}

#[test]
#[serial]
fn test_database_path_has_compiled_default() {
    env::remove_var("PARLSYNC_DATABASE");

    let path = resolve_database_path(&TomlConfig::default());
    assert!(!path.as_os_str().is_empty());
    assert!(path.to_string_lossy().ends_with("parlsync.db"));
}

#[test]
#[serial]
fn test_dump_path_resolution_order() {
    env::set_var("PARLSYNC_DUMP", "/tmp/from-env.json");
    let config = TomlConfig {
        dump_path: Some("/tmp/from-config.json".to_string()),
        ..Default::default()
    };
    assert_eq!(
        resolve_dump_path(&config).expect("env dump path"),
        PathBuf::from("/tmp/from-env.json")
    );

    env::remove_var("PARLSYNC_DUMP");
    assert_eq!(
        resolve_dump_path(&config).expect("config dump path"),
        PathBuf::from("/tmp/from-config.json")
    );

    // No env var, no config entry: the importer refuses to guess
    assert!(resolve_dump_path(&TomlConfig::default()).is_err());
}

#[test]
fn test_load_reads_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).expect("create");
    writeln!(file, "database_path = \"/data/parlsync.db\"").expect("write");
    writeln!(file, "dump_path = \"/data/dump.json\"").expect("write");

    let config = TomlConfig::load(&path).expect("load");
    assert_eq!(config.database_path.as_deref(), Some("/data/parlsync.db"));
    assert_eq!(config.dump_path.as_deref(), Some("/data/dump.json"));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "database_path = [not toml").expect("write");

    assert!(TomlConfig::load(&path).is_err());
}
