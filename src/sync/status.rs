//! Sync status display.
//!
//! Status compares what the snapshot holds with what the local library
//! holds, and lists recent sync runs from the event log.

use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::model::CollectionCounts;
use crate::storage::sqlite::SqliteStorage;
use crate::sync::file::{file_size, is_writable_dir};
use crate::sync::hash::content_hash;
use crate::sync::snapshot::SnapshotStore;
use crate::sync::types::{SyncError, SyncResult, SyncStatus};

/// Number of events shown by `status`.
const RECENT_EVENTS: u32 = 5;

/// Get the current sync status.
///
/// A snapshot that cannot be decoded is reported through
/// [`SyncStatus::decode_error`] rather than as an error.
///
/// # Errors
///
/// Returns an error if database queries fail or the snapshot cannot be read.
pub fn get_sync_status(storage: &SqliteStorage, location: Option<&Path>) -> SyncResult<SyncStatus> {
    let local_counts = storage.collection_counts()?;
    let recent_events = storage.recent_events(RECENT_EVENTS)?;

    let mut status = SyncStatus {
        location: location.map(Path::to_path_buf),
        location_available: location.is_some_and(is_writable_dir),
        snapshot_path: None,
        snapshot_exists: false,
        snapshot_size: 0,
        snapshot_modified: None,
        content_hash: None,
        decode_error: None,
        snapshot_counts: CollectionCounts::default(),
        local_counts,
        recent_events,
    };

    let Some(dir) = location else {
        return Ok(status);
    };

    let snapshots = SnapshotStore::in_dir(dir);
    status.snapshot_path = Some(snapshots.path().to_path_buf());
    status.snapshot_exists = snapshots.exists();
    if !status.snapshot_exists {
        return Ok(status);
    }

    status.snapshot_size = file_size(snapshots.path());
    status.snapshot_modified = std::fs::metadata(snapshots.path())
        .and_then(|m| m.modified())
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

    match snapshots.try_read() {
        Ok(Some(snapshot)) => {
            status.snapshot_counts = snapshot.counts();
            status.content_hash = Some(content_hash(&snapshot));
        }
        Ok(None) => status.snapshot_exists = false,
        Err(SyncError::Decode { message, .. }) => status.decode_error = Some(message),
        Err(e) => return Err(e),
    }

    Ok(status)
}

/// Print sync status to stdout in a human-readable format.
pub fn print_status(status: &SyncStatus) {
    println!("{}", "Sync Status".bold().underline());
    println!();

    match &status.location {
        None => {
            println!("{}", "No sync location configured.".yellow());
            println!(
                "{}",
                "Run 'autosync location set <dir>' to choose one.".dimmed()
            );
        }
        Some(dir) if !status.location_available => {
            println!("Location: {}", dir.display());
            println!("{}", "  Directory is missing or read-only.".red());
        }
        Some(dir) => println!("Location: {}", dir.display()),
    }
    println!();

    if let Some(error) = &status.decode_error {
        println!("{}", "Snapshot is unreadable:".red().bold());
        println!("  {error}");
        println!(
            "{}",
            "The next export will replace it with local data.".dimmed()
        );
        println!();
    } else if status.snapshot_exists {
        println!("{}", "Snapshot:".blue().bold());
        println!("  Size:      {}", format_size(status.snapshot_size));
        if let Some(modified) = &status.snapshot_modified {
            println!("  Modified:  {modified}");
        }
        if let Some(hash) = &status.content_hash {
            println!("  Hash:      {}", &hash[..hash.len().min(12)]);
        }
        println!();
    } else if status.location.is_some() {
        println!("{}", "No snapshot yet.".dimmed());
        println!("{}", "Run 'autosync export' to create one.".dimmed());
        println!();
    }

    print_counts(&status.snapshot_counts, &status.local_counts, status.snapshot_exists);

    if !status.recent_events.is_empty() {
        println!();
        println!("{}", "Recent Runs:".blue().bold());
        for event in &status.recent_events {
            let when = DateTime::<Utc>::from_timestamp_millis(event.created_at)
                .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
            let detail = event.detail.as_deref().unwrap_or("");
            println!("  {when}  {:<20} {detail}", event.event_type.as_str());
        }
    }
}

fn print_counts(snapshot: &CollectionCounts, local: &CollectionCounts, show_snapshot: bool) {
    let rows = [
        ("Watch history", snapshot.watch_history, local.watch_history),
        ("Watch positions", snapshot.watch_positions, local.watch_positions),
        ("Search history", snapshot.search_history, local.search_history),
        ("Bookmarks", snapshot.playlist_bookmarks, local.playlist_bookmarks),
        ("Groups", snapshot.groups, local.groups),
        ("Subscriptions", snapshot.subscriptions, local.subscriptions),
        ("Playlists", snapshot.local_playlists, local.local_playlists),
        ("Playlist videos", snapshot.playlist_videos, local.playlist_videos),
    ];

    if show_snapshot {
        println!("  {:<16} {:>9} {:>9}", "", "Snapshot".bold(), "Local".bold());
        for (label, in_snapshot, in_local) in rows {
            println!("  {label:<16} {in_snapshot:>9} {in_local:>9}");
        }
    } else {
        println!("{}", "Local Library:".blue().bold());
        for (label, _, in_local) in rows {
            println!("  {label:<16} {in_local:>9}");
        }
    }
}

/// Format a byte size as a human-readable string.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Snapshot, WatchPosition};
    use crate::storage::LocalStoreMutator;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn test_status_without_location() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .upsert_watch_positions(&[WatchPosition::new("x", 1)])
            .unwrap();

        let status = get_sync_status(&storage, None).unwrap();

        assert!(status.location.is_none());
        assert!(!status.location_available);
        assert!(status.snapshot_path.is_none());
        assert_eq!(status.local_counts.watch_positions, 1);
    }

    #[test]
    fn test_status_with_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SqliteStorage::open_memory().unwrap();
        let snapshot = Snapshot {
            watch_positions: Some(vec![WatchPosition::new("x", 1), WatchPosition::new("y", 2)]),
            ..Snapshot::default()
        };
        SnapshotStore::in_dir(temp_dir.path())
            .write_snapshot(&snapshot)
            .unwrap();

        let status = get_sync_status(&storage, Some(temp_dir.path())).unwrap();

        assert!(status.location_available);
        assert!(status.snapshot_exists);
        assert!(status.snapshot_size > 0);
        assert!(status.snapshot_modified.is_some());
        assert_eq!(status.content_hash, Some(content_hash(&snapshot)));
        assert_eq!(status.snapshot_counts.watch_positions, 2);
        assert_eq!(status.local_counts.total(), 0);
    }

    #[test]
    fn test_status_reports_corrupt_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SqliteStorage::open_memory().unwrap();
        std::fs::write(SnapshotStore::in_dir(temp_dir.path()).path(), "nope").unwrap();

        let status = get_sync_status(&storage, Some(temp_dir.path())).unwrap();

        assert!(status.snapshot_exists);
        assert!(status.decode_error.is_some());
        assert!(status.content_hash.is_none());
    }
}
