//! Snapshot export.
//!
//! Export never replaces the snapshot with local state. It reads the stored
//! snapshot as a base, merges every local collection into it, and writes the
//! result back, so records contributed by other devices survive.
//!
//! # Precedence
//!
//! With the default [`MergeStrategy::PreferBase`] a record already in the
//! snapshot wins over the local record with the same key. Local edits to a
//! record the snapshot already holds are therefore not propagated; use
//! [`MergeStrategy::PreferIncoming`] to let local records win.

use std::path::Path;

use tracing::{debug, info};

use crate::model::Snapshot;
use crate::storage::LocalStoreView;
use crate::sync::file::is_writable_dir;
use crate::sync::hash::content_hash;
use crate::sync::merge::{merge_by_key, merge_playlists};
use crate::sync::snapshot::SnapshotStore;
use crate::sync::types::{ExportStats, MergeStrategy, SkipReason, SyncOutcome, SyncResult};

/// Merges local state into the snapshot in a sync directory.
pub struct Exporter<'a, S: LocalStoreView + ?Sized> {
    store: &'a S,
    location: Option<&'a Path>,
    strategy: MergeStrategy,
}

impl<'a, S: LocalStoreView + ?Sized> Exporter<'a, S> {
    /// Create an exporter reading from `store`.
    ///
    /// `location` is the sync directory; `None` means sync is not set up.
    #[must_use]
    pub fn new(store: &'a S, location: Option<&'a Path>) -> Self {
        Self {
            store,
            location,
            strategy: MergeStrategy::default(),
        }
    }

    /// Use `strategy` for key conflicts between snapshot and local records.
    #[must_use]
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Merge local state into the snapshot and write it.
    ///
    /// A missing or undecodable snapshot is treated as empty. When the merged
    /// snapshot equals the stored one, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read or the write fails.
    pub fn export(&self) -> SyncResult<SyncOutcome<ExportStats>> {
        let Some(dir) = self.location else {
            debug!("Export skipped: no sync location");
            return Ok(SyncOutcome::Skipped(SkipReason::NotConfigured));
        };
        if !is_writable_dir(dir) {
            debug!(dir = %dir.display(), "Export skipped: location unavailable");
            return Ok(SyncOutcome::Skipped(SkipReason::LocationUnavailable(
                dir.to_path_buf(),
            )));
        }

        let snapshots = SnapshotStore::in_dir(dir);
        let base = snapshots.read_snapshot();
        let base_hash = content_hash(&base);
        let base_total = base.counts().total();

        let merged = self.merge(base)?;
        let hash = content_hash(&merged);
        let unchanged = snapshots.exists() && hash == base_hash;

        if unchanged {
            info!(path = %snapshots.path().display(), "Snapshot already up to date");
        } else {
            snapshots.write_snapshot(&merged)?;
            info!(
                path = %snapshots.path().display(),
                records = merged.counts().total(),
                "Exported snapshot"
            );
        }

        Ok(SyncOutcome::Completed(ExportStats {
            counts: merged.counts(),
            base_total,
            unchanged,
            path: snapshots.path().to_path_buf(),
            content_hash: hash,
        }))
    }

    /// Merge every local collection into `base`.
    fn merge(&self, base: Snapshot) -> SyncResult<Snapshot> {
        let strategy = self.strategy;
        let store = self.store;

        Ok(Snapshot {
            watch_history: Some(merge_by_key(
                base.watch_history.unwrap_or_default(),
                store.watch_history()?,
                |r| r.video_id.clone(),
                strategy,
            )),
            watch_positions: Some(merge_by_key(
                base.watch_positions.unwrap_or_default(),
                store.watch_positions()?,
                |r| r.video_id.clone(),
                strategy,
            )),
            search_history: Some(merge_by_key(
                base.search_history.unwrap_or_default(),
                store.search_history()?,
                |r| r.query.clone(),
                strategy,
            )),
            playlist_bookmarks: Some(merge_by_key(
                base.playlist_bookmarks.unwrap_or_default(),
                store.playlist_bookmarks()?,
                |r| r.playlist_id.clone(),
                strategy,
            )),
            groups: Some(merge_by_key(
                base.groups.unwrap_or_default(),
                store.subscription_groups()?,
                |r| r.name.clone(),
                strategy,
            )),
            subscriptions: Some(merge_by_key(
                base.subscriptions.unwrap_or_default(),
                store.subscriptions()?,
                |r| r.channel_id.clone(),
                strategy,
            )),
            local_playlists: Some(merge_playlists(
                base.local_playlists.unwrap_or_default(),
                store.local_playlists()?,
                strategy,
            )),
            playlists: Some(Vec::new()),
        })
    }
}
