//! The snapshot document on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::model::Snapshot;
use crate::sync::file::atomic_write;
use crate::sync::types::{SyncError, SyncResult};

/// File name of the snapshot inside the sync directory.
pub const SNAPSHOT_FILE_NAME: &str = "autosync.json";

/// Reads and writes the single snapshot document in a sync directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store for `dir/autosync.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SNAPSHOT_FILE_NAME),
        }
    }

    /// Snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the snapshot file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the snapshot, treating anything unusable as empty.
    ///
    /// A missing, zero-length, unreadable or undecodable document yields
    /// [`Snapshot::empty`]. Problems are logged, never returned.
    #[must_use]
    pub fn read_snapshot(&self) -> Snapshot {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot yet");
                return Snapshot::empty();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read snapshot, using empty base");
                return Snapshot::empty();
            }
        };

        if bytes.is_empty() {
            return Snapshot::empty();
        }

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot decode snapshot, using empty base");
                Snapshot::empty()
            }
        }
    }

    /// Read the snapshot strictly.
    ///
    /// Returns `None` when there is no document.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decode`] if the document exists but is not a
    /// valid snapshot, or [`SyncError::Io`] if it cannot be read.
    pub fn try_read(&self) -> SyncResult<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SyncError::Decode {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// Replace the document with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails.
    pub fn write_snapshot(&self, snapshot: &Snapshot) -> SyncResult<()> {
        let bytes = serde_json::to_vec(snapshot)?;
        atomic_write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Wrote snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SearchHistoryItem, WatchPosition};
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::in_dir(temp_dir.path());

        assert!(!store.exists());
        assert_eq!(store.read_snapshot(), Snapshot::empty());
        assert!(store.try_read().unwrap().is_none());
    }

    #[test]
    fn test_read_corrupt_is_empty_but_strict_read_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::in_dir(temp_dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.read_snapshot(), Snapshot::empty());
        assert!(matches!(store.try_read(), Err(SyncError::Decode { .. })));
    }

    #[test]
    fn test_read_zero_length_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::in_dir(temp_dir.path());
        fs::write(store.path(), "").unwrap();

        assert_eq!(store.read_snapshot(), Snapshot::empty());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::in_dir(temp_dir.path());
        let snapshot = Snapshot {
            watch_positions: Some(vec![WatchPosition::new("x", 10)]),
            search_history: Some(vec![SearchHistoryItem::new("rust")]),
            ..Snapshot::default()
        };

        store.write_snapshot(&snapshot).unwrap();

        assert_eq!(store.path().file_name().unwrap(), SNAPSHOT_FILE_NAME);
        assert_eq!(store.read_snapshot(), snapshot);
        assert_eq!(store.try_read().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::in_dir(temp_dir.path());
        fs::write(
            store.path(),
            r#"{"watchPositions":[{"videoId":"x","position":5}],"preferences":[{"key":"k"}]}"#,
        )
        .unwrap();

        let snapshot = store.try_read().unwrap().unwrap();
        assert_eq!(snapshot.watch_positions, Some(vec![WatchPosition::new("x", 5)]));
        assert_eq!(snapshot.groups, None);
    }
}
