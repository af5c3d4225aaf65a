//! Configuration loading and path resolution
//!
//! Settings are resolved with a fixed priority order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML configuration file contents
///
/// All fields are optional; anything absent falls back to the environment
/// variable or the compiled default for that setting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path of the SQLite database file
    pub database_path: Option<String>,

    /// Path of the downloaded representative dump to import
    pub dump_path: Option<String>,

    /// Override path for the name correction table
    pub name_corrections: Option<String>,

    /// Override path for the political-group alias table
    pub group_aliases: Option<String>,
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load configuration from the resolved config file location
    ///
    /// Missing config files are not an error; resolution falls through to
    /// environment variables and compiled defaults.
    pub fn load_default() -> Self {
        match config_file_path() {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => {
                    tracing::info!("Loaded config file: {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config file: {}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }
}

/// Config file location: `$PARLSYNC_CONFIG`, else the platform config dir
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PARLSYNC_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("parlsync").join("config.toml"))
}

/// Resolve the SQLite database path
///
/// Priority: `PARLSYNC_DATABASE` env var, `database_path` from the config
/// file, then `parlsync.db` under the platform data dir.
pub fn resolve_database_path(config: &TomlConfig) -> PathBuf {
    if let Ok(path) = std::env::var("PARLSYNC_DATABASE") {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.database_path {
        return PathBuf::from(path);
    }
    dirs::data_local_dir()
        .map(|d| d.join("parlsync").join("parlsync.db"))
        .unwrap_or_else(|| PathBuf::from("./parlsync.db"))
}

/// Resolve the dump file path to import
///
/// Priority: `PARLSYNC_DUMP` env var, then `dump_path` from the config
/// file. There is no compiled default; acquisition of the dump is an
/// external concern and the importer refuses to guess.
pub fn resolve_dump_path(config: &TomlConfig) -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PARLSYNC_DUMP") {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = &config.dump_path {
        return Ok(PathBuf::from(path));
    }
    Err(Error::Config(
        "No dump file configured. Set PARLSYNC_DUMP or dump_path in config.toml".to_string(),
    ))
}
