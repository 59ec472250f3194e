//! Sync command implementations (snapshot export/import).

use crate::config::{require_db_path, resolve_sync_dir};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use crate::sync::{
    record_export, record_import, EntityStats, ExportStats, Exporter, ImportStats, Importer,
    MergeStrategy, SkipReason, SyncOutcome, SyncSupervisor,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Merge the local library into the snapshot.
///
/// # Errors
///
/// Returns an error if the database is missing or the export fails.
pub fn export(
    db_path: Option<&PathBuf>,
    dir: Option<&PathBuf>,
    prefer_local: bool,
    json: bool,
) -> Result<()> {
    let db_path = require_db_path(db_path.map(PathBuf::as_path))?;
    let mut storage = SqliteStorage::open_existing(&db_path)?;
    let location = resolve_sync_dir(dir.map(PathBuf::as_path))?;

    let strategy = if prefer_local {
        MergeStrategy::PreferIncoming
    } else {
        MergeStrategy::PreferBase
    };

    let result = Exporter::new(&storage, location.as_deref())
        .with_strategy(strategy)
        .export();
    record_export(&mut storage, &result);

    match result? {
        SyncOutcome::Completed(stats) => print_export(&stats, strategy, json),
        SyncOutcome::Skipped(reason) => print_skipped("export", &reason, json),
    }
}

/// Apply the snapshot to the local library.
///
/// # Errors
///
/// Returns an error if the database is missing, the snapshot cannot be
/// decoded, or a write fails.
pub fn import(db_path: Option<&PathBuf>, dir: Option<&PathBuf>, json: bool) -> Result<()> {
    let db_path = require_db_path(db_path.map(PathBuf::as_path))?;
    let mut storage = SqliteStorage::open_existing(&db_path)?;
    let location = resolve_sync_dir(dir.map(PathBuf::as_path))?;

    let result = Importer::new(&mut storage, location.as_deref()).import();
    record_import(&mut storage, &result);

    match result? {
        SyncOutcome::Completed(stats) => print_import(&stats, json),
        SyncOutcome::Skipped(reason) => print_skipped("import", &reason, json),
    }
}

/// Export when the app is dismissed.
///
/// Fire-and-forget from the caller's point of view: failures and timeouts
/// are logged, and the command always succeeds.
///
/// # Errors
///
/// Only if JSON output cannot be serialized.
pub fn on_dismiss(
    db_path: Option<&PathBuf>,
    dir: Option<&PathBuf>,
    timeout_ms: u64,
    json: bool,
) -> Result<()> {
    let result = run_on_dismiss(db_path, dir, Duration::from_millis(timeout_ms));

    let outcome = match result {
        Ok(SyncOutcome::Completed(stats)) if stats.unchanged => "unchanged".to_string(),
        Ok(SyncOutcome::Completed(_)) => "exported".to_string(),
        Ok(SyncOutcome::Skipped(reason)) => format!("skipped: {reason}"),
        Err(e) => {
            warn!(error = %e, "Export on dismiss failed");
            format!("failed: {e}")
        }
    };

    if json {
        let output = serde_json::json!({ "outcome": outcome });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Export on dismiss: {outcome}");
    }
    Ok(())
}

fn run_on_dismiss(
    db_path: Option<&PathBuf>,
    dir: Option<&PathBuf>,
    deadline: Duration,
) -> Result<SyncOutcome<ExportStats>> {
    let db_path = require_db_path(db_path.map(PathBuf::as_path))?;
    let location = resolve_sync_dir(dir.map(PathBuf::as_path))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create tokio runtime: {e}")))?;

    let supervisor = SyncSupervisor::new(db_path, location);
    let result = rt.block_on(supervisor.export_before_exit(deadline));

    // Don't wait for a run that missed the deadline
    rt.shutdown_background();
    Ok(result?)
}

fn print_export(stats: &ExportStats, strategy: MergeStrategy, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "success": true,
            "strategy": strategy,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if stats.unchanged {
        println!("Snapshot already up to date ({} records).", stats.total());
        println!("  Location: {}", stats.path.display());
        return Ok(());
    }

    let counts = &stats.counts;
    println!("Export complete");
    println!();
    println!("  Watch history:   {}", counts.watch_history);
    println!("  Watch positions: {}", counts.watch_positions);
    println!("  Search history:  {}", counts.search_history);
    println!("  Bookmarks:       {}", counts.playlist_bookmarks);
    println!("  Groups:          {}", counts.groups);
    println!("  Subscriptions:   {}", counts.subscriptions);
    println!(
        "  Playlists:       {} ({} videos)",
        counts.local_playlists, counts.playlist_videos
    );
    println!();
    println!("  Total: {} records ({} new)", stats.total(), stats.added());
    println!("  Location: {}", stats.path.display());
    Ok(())
}

fn print_import(stats: &ImportStats, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "success": true,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if stats.total_processed() == 0 {
        println!("Snapshot is empty; nothing to import.");
        return Ok(());
    }

    println!("Import complete");
    println!();
    print_entity_stats("Watch history", &stats.watch_history);
    print_entity_stats("Watch positions", &stats.watch_positions);
    print_entity_stats("Search history", &stats.search_history);
    print_entity_stats("Bookmarks", &stats.playlist_bookmarks);
    print_entity_stats("Groups", &stats.groups);
    print_entity_stats("Subscriptions", &stats.subscriptions);
    print_entity_stats("Playlists", &stats.playlists);
    print_entity_stats("Playlist videos", &stats.playlist_videos);
    println!();
    println!(
        "Total: {} created, {} updated, {} already present",
        stats.total_created(),
        stats.total_updated(),
        stats.total_conflicts()
    );
    Ok(())
}

fn print_entity_stats(name: &str, stats: &EntityStats) {
    if stats.total() == 0 {
        return;
    }
    let mut parts = vec![format!("{} created", stats.created)];
    if stats.updated > 0 {
        parts.push(format!("{} updated", stats.updated));
    }
    if stats.skipped > 0 {
        parts.push(format!("{} matched", stats.skipped));
    }
    if stats.conflicts > 0 {
        parts.push(format!("{} already present", stats.conflicts));
    }
    println!("  {name:<16} {}", parts.join(", "));
}

fn print_skipped(op: &str, reason: &SkipReason, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "success": true,
            "skipped": reason,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Nothing to {op}: {reason}");
        if matches!(reason, SkipReason::NotConfigured) {
            println!("Run 'autosync location set <dir>' to choose a sync location.");
        }
    }
    Ok(())
}
