//! Persisted settings.
//!
//! A small JSON file holding the chosen sync location. Written with the
//! same temp-file-then-rename pattern as snapshots so a crash never leaves
//! a half-written file behind.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sync::{atomic_write, is_writable_dir};

/// User settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Directory holding the shared snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(Self::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("Invalid settings file {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write settings to `path`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Choose `dir` as the sync location, replacing any previous one.
    ///
    /// The directory must already exist and be writable. The stored path is
    /// canonicalized so later runs from another working directory agree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocationUnavailable`] if `dir` is not a writable directory.
    pub fn set_sync_dir(&mut self, dir: &Path) -> Result<&Path> {
        if !is_writable_dir(dir) {
            return Err(Error::LocationUnavailable {
                path: dir.to_path_buf(),
            });
        }
        let dir = fs::canonicalize(dir)?;
        Ok(self.sync_dir.insert(dir).as_path())
    }

    /// Forget the sync location. Returns the previous one.
    pub fn clear_sync_dir(&mut self) -> Option<PathBuf> {
        self.sync_dir.take()
    }
}
