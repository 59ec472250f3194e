//! Shared types for snapshot export and import.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::model::CollectionCounts;
use crate::storage::events::Event;

/// Which side wins when both hold a record with the same merge key.
///
/// On export the base is the stored snapshot and the incoming side is the
/// local library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep the base record. Equivalent to concatenating and keeping the
    /// first occurrence of every key.
    #[default]
    PreferBase,
    /// Replace the base record with the incoming one, keeping the base's position.
    PreferIncoming,
}

/// Result of a run that may decide not to do anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum SyncOutcome<T> {
    /// The run finished.
    Completed(T),
    /// The run was a no-op. Nothing was read from or written to the store.
    Skipped(SkipReason),
}

impl<T> SyncOutcome<T> {
    /// The completed value, if any.
    #[must_use]
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    /// Whether the run was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Why a run was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "path", rename_all = "snake_case")]
pub enum SkipReason {
    /// No sync location has been chosen.
    NotConfigured,
    /// The sync location is not an existing, writable directory.
    LocationUnavailable(PathBuf),
    /// There is no snapshot to import yet.
    NoSnapshot,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "no sync location configured"),
            Self::LocationUnavailable(path) => {
                write!(f, "sync location unavailable: {}", path.display())
            }
            Self::NoSnapshot => write!(f, "no snapshot to import"),
        }
    }
}

/// Statistics for an export operation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Record counts in the written (or unchanged) snapshot.
    pub counts: CollectionCounts,
    /// Records the base snapshot already held.
    pub base_total: usize,
    /// True when the merged snapshot matched the stored one and no write happened.
    pub unchanged: bool,
    /// Snapshot file path.
    pub path: PathBuf,
    /// SHA256 of the snapshot now on disk.
    pub content_hash: String,
}

impl ExportStats {
    /// Total records in the snapshot.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.total()
    }

    /// Records added to the snapshot by this export.
    #[must_use]
    pub fn added(&self) -> usize {
        self.total().saturating_sub(self.base_total)
    }
}

/// Statistics for an import operation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub watch_history: EntityStats,
    pub watch_positions: EntityStats,
    pub search_history: EntityStats,
    pub playlist_bookmarks: EntityStats,
    pub groups: EntityStats,
    pub subscriptions: EntityStats,
    /// Playlists: `created` are new locally, `skipped` matched an existing name.
    pub playlists: EntityStats,
    /// Playlist videos: `conflicts` were already in their playlist.
    pub playlist_videos: EntityStats,
}

impl ImportStats {
    fn all(&self) -> [&EntityStats; 8] {
        [
            &self.watch_history,
            &self.watch_positions,
            &self.search_history,
            &self.playlist_bookmarks,
            &self.groups,
            &self.subscriptions,
            &self.playlists,
            &self.playlist_videos,
        ]
    }

    /// Total number of records processed.
    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.all().iter().map(|s| s.total()).sum()
    }

    /// Total number of records created.
    #[must_use]
    pub fn total_created(&self) -> usize {
        self.all().iter().map(|s| s.created).sum()
    }

    /// Total number of records updated.
    #[must_use]
    pub fn total_updated(&self) -> usize {
        self.all().iter().map(|s| s.updated).sum()
    }

    /// Total number of absorbed conflicts.
    #[must_use]
    pub fn total_conflicts(&self) -> usize {
        self.all().iter().map(|s| s.conflicts).sum()
    }
}

/// Per-entity statistics for import operations.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    /// Number of new records created.
    pub created: usize,
    /// Number of existing records updated.
    pub updated: usize,
    /// Number of records matched and left alone.
    pub skipped: usize,
    /// Number of conflicts encountered.
    pub conflicts: usize,
}

impl EntityStats {
    /// Total records processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.conflicts
    }

    /// Count one insert-or-replace.
    pub fn record_upsert(&mut self, existed: bool) {
        if existed {
            self.updated += 1;
        } else {
            self.created += 1;
        }
    }
}

/// Sync status information.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    /// Resolved sync directory, if any.
    pub location: Option<PathBuf>,
    /// Whether the directory exists and is writable.
    pub location_available: bool,
    /// Snapshot file path.
    pub snapshot_path: Option<PathBuf>,
    /// Whether the snapshot file exists.
    pub snapshot_exists: bool,
    /// Snapshot size in bytes.
    pub snapshot_size: u64,
    /// Snapshot modification time (RFC 3339).
    pub snapshot_modified: Option<String>,
    /// SHA256 of the decoded snapshot.
    pub content_hash: Option<String>,
    /// Why the snapshot could not be decoded.
    pub decode_error: Option<String>,
    /// Record counts in the snapshot.
    pub snapshot_counts: CollectionCounts,
    /// Record counts in the local store.
    pub local_counts: CollectionCounts,
    /// Most recent sync events, newest first.
    pub recent_events: Vec<Event>,
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot exists but is not a valid document.
    #[error("Cannot decode snapshot {path}: {message}")]
    Decode {
        /// Snapshot path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// Local store error.
    #[error(transparent)]
    Store(#[from] crate::error::Error),

    /// A supervised run did not finish in time.
    #[error("Sync did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    /// A background sync task panicked or was cancelled.
    #[error("Sync task failed: {0}")]
    Task(String),
}

impl From<SyncError> for crate::error::Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(inner) => inner,
            SyncError::Io(e) => Self::Io(e),
            other => Self::Sync(other.to_string()),
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_stats() {
        let mut stats = EntityStats::default();
        stats.record_upsert(false);
        stats.record_upsert(true);
        stats.record_upsert(true);
        stats.conflicts = 1;

        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn test_import_stats_totals() {
        let mut stats = ImportStats::default();
        stats.watch_positions.updated = 1;
        stats.playlists.created = 1;
        stats.playlist_videos.created = 2;
        stats.playlist_videos.conflicts = 1;

        assert_eq!(stats.total_processed(), 5);
        assert_eq!(stats.total_created(), 3);
        assert_eq!(stats.total_updated(), 1);
        assert_eq!(stats.total_conflicts(), 1);
    }

    #[test]
    fn test_merge_strategy_default() {
        assert_eq!(MergeStrategy::default(), MergeStrategy::PreferBase);
    }

    #[test]
    fn test_outcome_json_shape() {
        let skipped: SyncOutcome<ExportStats> = SyncOutcome::Skipped(SkipReason::NotConfigured);
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["result"]["reason"], "not_configured");
        assert!(skipped.is_skipped());
    }

    #[test]
    fn test_sync_error_into_crate_error() {
        let err: crate::error::Error = SyncError::DeadlineExceeded(Duration::from_secs(1)).into();
        assert_eq!(err.exit_code(), 6);

        let inner = crate::error::Error::InvalidArgument("x".into());
        let err: crate::error::Error = SyncError::Store(inner).into();
        assert_eq!(err.exit_code(), 4);
    }
}
