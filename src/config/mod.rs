//! Configuration management.
//!
//! Everything lives under one config directory:
//! - **Database**: `<config>/data/library.db`
//! - **Settings**: `<config>/settings.json` (the chosen sync location)
//!
//! The config directory is `AUTOSYNC_CONFIG_DIR` if set, else `~/.autosync`.

mod settings;

pub use settings::Settings;

use crate::error::{Error, Result};

use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "AUTOSYNC_CONFIG_DIR";

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "AUTOSYNC_DB";

/// Environment variable overriding the sync directory.
pub const SYNC_DIR_ENV: &str = "AUTOSYNC_DIR";

/// Non-empty value of an environment variable.
fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Get the config directory location.
///
/// Priority:
/// 1. `AUTOSYNC_CONFIG_DIR` environment variable
/// 2. `~/.autosync`
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    env_path(CONFIG_DIR_ENV)
        .or_else(|| directories::BaseDirs::new().map(|b| b.home_dir().join(".autosync")))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `AUTOSYNC_DB` environment variable
/// 3. `<config>/data/library.db`
///
/// Returns `None` if no home directory can be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Explicit path from CLI flag
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: AUTOSYNC_DB environment variable
    if let Some(path) = env_path(DB_ENV) {
        return Some(path);
    }

    // Priority 3: Config directory
    config_dir().map(|dir| dir.join("data").join("library.db"))
}

/// Path of the settings file.
#[must_use]
pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("settings.json"))
}

/// Resolve the sync directory.
///
/// Priority:
/// 1. If `explicit_dir` is provided (`--dir` / `AUTOSYNC_DIR`), use it
/// 2. The location saved with `autosync location set`
///
/// `None` means sync has not been set up.
///
/// # Errors
///
/// Returns an error if the settings file exists but cannot be read.
pub fn resolve_sync_dir(explicit_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(dir) = explicit_dir {
        return Ok(Some(dir.to_path_buf()));
    }

    let Some(path) = settings_path() else {
        return Ok(None);
    };
    Ok(Settings::load_from(&path)?.sync_dir)
}

/// Require the database path, failing with a config error when unresolvable.
///
/// # Errors
///
/// Returns [`Error::Config`] if no path can be determined.
pub fn require_db_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    resolve_db_path(explicit_path)
        .ok_or_else(|| Error::Config("Could not determine database path".to_string()))
}

/// Require the settings path, failing with a config error when unresolvable.
///
/// # Errors
///
/// Returns [`Error::Config`] if no path can be determined.
pub fn require_settings_path() -> Result<PathBuf> {
    settings_path().ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}
