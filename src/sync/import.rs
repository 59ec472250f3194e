//! Snapshot import.
//!
//! Import applies a snapshot on top of the local library. Flat collections
//! are upserted by key, so a record present in both places ends up with the
//! snapshot's values. Playlists are matched by name and only ever gain
//! videos. Nothing local is deleted.

use std::path::Path;

use tracing::{debug, info};

use crate::model::{LocalPlaylistWithVideos, Snapshot};
use crate::storage::LocalStoreMutator;
use crate::sync::snapshot::SnapshotStore;
use crate::sync::types::{EntityStats, ImportStats, SkipReason, SyncOutcome, SyncResult};

/// Applies the snapshot in a sync directory to the local store.
pub struct Importer<'a, S: LocalStoreMutator + ?Sized> {
    store: &'a mut S,
    location: Option<&'a Path>,
}

impl<'a, S: LocalStoreMutator + ?Sized> Importer<'a, S> {
    /// Create an importer writing into `store`.
    ///
    /// `location` is the sync directory; `None` means sync is not set up.
    #[must_use]
    pub fn new(store: &'a mut S, location: Option<&'a Path>) -> Self {
        Self { store, location }
    }

    /// Read the snapshot and apply it.
    ///
    /// Each collection is applied in its own transaction. If a later
    /// collection fails, the ones already applied stay applied.
    ///
    /// # Errors
    ///
    /// Returns [`crate::sync::SyncError::Decode`] if the snapshot cannot be
    /// decoded (before anything is written), or an error if the store rejects
    /// a write. Videos already present in their playlist are counted as
    /// conflicts, not errors.
    pub fn import(&mut self) -> SyncResult<SyncOutcome<ImportStats>> {
        let Some(dir) = self.location else {
            debug!("Import skipped: no sync location");
            return Ok(SyncOutcome::Skipped(SkipReason::NotConfigured));
        };

        let snapshots = SnapshotStore::in_dir(dir);
        let Some(snapshot) = snapshots.try_read()? else {
            debug!(path = %snapshots.path().display(), "Import skipped: no snapshot");
            return Ok(SyncOutcome::Skipped(SkipReason::NoSnapshot));
        };

        let stats = self.apply(snapshot)?;
        info!(
            path = %snapshots.path().display(),
            created = stats.total_created(),
            updated = stats.total_updated(),
            conflicts = stats.total_conflicts(),
            "Imported snapshot"
        );
        Ok(SyncOutcome::Completed(stats))
    }

    /// Apply an already decoded snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a write.
    pub fn apply(&mut self, snapshot: Snapshot) -> SyncResult<ImportStats> {
        let mut stats = ImportStats::default();

        if let Some(items) = non_empty(snapshot.watch_history) {
            stats.watch_history = self.store.upsert_watch_history(&items)?;
        }
        if let Some(items) = non_empty(snapshot.watch_positions) {
            stats.watch_positions = self.store.upsert_watch_positions(&items)?;
        }
        if let Some(items) = non_empty(snapshot.playlist_bookmarks) {
            stats.playlist_bookmarks = self.store.upsert_playlist_bookmarks(&items)?;
        }
        if let Some(items) = non_empty(snapshot.search_history) {
            stats.search_history = self.store.upsert_search_history(&items)?;
        }
        if let Some(items) = non_empty(snapshot.groups) {
            stats.groups = self.store.upsert_subscription_groups(&items)?;
        }
        if let Some(items) = non_empty(snapshot.subscriptions) {
            stats.subscriptions = self.store.upsert_subscriptions(&items)?;
        }

        for playlist in snapshot.local_playlists.unwrap_or_default() {
            self.import_playlist(playlist, &mut stats.playlists, &mut stats.playlist_videos)?;
        }

        Ok(stats)
    }

    /// Find or create the playlist by name, then add each video to it.
    fn import_playlist(
        &mut self,
        imported: LocalPlaylistWithVideos,
        playlists: &mut EntityStats,
        videos: &mut EntityStats,
    ) -> SyncResult<()> {
        let LocalPlaylistWithVideos {
            playlist,
            videos: items,
        } = imported;

        let playlist_id = if let Some(id) = self.store.find_playlist_by_name(&playlist.name)? {
            playlists.skipped += 1;
            id
        } else {
            let id = self.store.create_playlist(&playlist)?;
            debug!(name = %playlist.name, id, "Created playlist");
            playlists.created += 1;
            id
        };

        for mut video in items {
            video.id = 0;
            video.playlist_id = playlist_id;
            match self.store.insert_playlist_video(playlist_id, &video) {
                Ok(_) => videos.created += 1,
                Err(e) if e.is_duplicate_video() => {
                    debug!(playlist_id, video_id = %video.video_id, "Video already in playlist");
                    videos.conflicts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

fn non_empty<T>(items: Option<Vec<T>>) -> Option<Vec<T>> {
    items.filter(|v| !v.is_empty())
}
