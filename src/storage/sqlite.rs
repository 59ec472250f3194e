//! SQLite storage implementation.
//!
//! Implements [`LocalStoreView`] and [`LocalStoreMutator`] on top of the
//! schema in [`crate::storage::schema`]. Every bulk write runs in a single
//! transaction so one collection is either fully applied or not at all.

use crate::error::{Error, Result};
use crate::model::{
    CollectionCounts, LocalPlaylist, LocalPlaylistItem, LocalPlaylistWithVideos,
    LocalSubscription, PlaylistBookmark, SearchHistoryItem, SubscriptionGroup, WatchHistoryItem,
    WatchPosition,
};
use crate::storage::events::{Event, insert_event, recent_events};
use crate::storage::schema::apply_schema;
use crate::storage::{LocalStoreMutator, LocalStoreView};
use crate::sync::EntityStats;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// SQLite-based library store.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing database, failing if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if `path` does not exist.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotInitialized {
                path: path.to_path_buf(),
            });
        }
        Self::open(path)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Run `f` inside an IMMEDIATE transaction, committing on success.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn transaction<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let result = f(&tx)?;
        tx.commit()?;

        debug!(op, "Committed");
        Ok(result)
    }

    // ==================
    // Sync events
    // ==================

    /// Append an entry to the sync event log.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn record_event(&mut self, event: &Event) -> Result<i64> {
        Ok(insert_event(&self.conn, event)?)
    }

    /// Most recent sync events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent_events(&self, limit: u32) -> Result<Vec<Event>> {
        Ok(recent_events(&self.conn, limit)?)
    }

    // ==================
    // Summary
    // ==================

    /// Count records in every synchronized collection.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn collection_counts(&self) -> Result<CollectionCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };

        Ok(CollectionCounts {
            watch_history: count("watch_history")?,
            watch_positions: count("watch_positions")?,
            search_history: count("search_history")?,
            playlist_bookmarks: count("playlist_bookmarks")?,
            groups: count("subscription_groups")?,
            subscriptions: count("subscriptions")?,
            local_playlists: count("local_playlists")?,
            playlist_videos: count("local_playlist_items")?,
        })
    }
}

/// Whether a row with `key` exists, using a `SELECT 1 ... WHERE key = ?1` query.
fn row_exists(tx: &Transaction, sql: &str, key: &str) -> Result<bool> {
    Ok(tx.query_row(sql, [key], |_| Ok(())).optional()?.is_some())
}

fn map_playlist_item(row: &rusqlite::Row) -> rusqlite::Result<LocalPlaylistItem> {
    Ok(LocalPlaylistItem {
        id: row.get(0)?,
        playlist_id: row.get(1)?,
        video_id: row.get(2)?,
        title: row.get(3)?,
        upload_date: row.get(4)?,
        uploader: row.get(5)?,
        uploader_url: row.get(6)?,
        uploader_avatar: row.get(7)?,
        thumbnail_url: row.get(8)?,
        duration: row.get(9)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ======================
// Reads (for export)
// ======================

impl LocalStoreView for SqliteStorage {
    fn watch_history(&self) -> Result<Vec<WatchHistoryItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT video_id, title, upload_date, uploader, uploader_url, uploader_avatar,
                    thumbnail_url, duration, last_watched
             FROM watch_history ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WatchHistoryItem {
                video_id: row.get(0)?,
                title: row.get(1)?,
                upload_date: row.get(2)?,
                uploader: row.get(3)?,
                uploader_url: row.get(4)?,
                uploader_avatar: row.get(5)?,
                thumbnail_url: row.get(6)?,
                duration: row.get(7)?,
                current_time: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn watch_positions(&self) -> Result<Vec<WatchPosition>> {
        let mut stmt = self
            .conn
            .prepare("SELECT video_id, position FROM watch_positions ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(WatchPosition {
                video_id: row.get(0)?,
                position: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn playlist_bookmarks(&self) -> Result<Vec<PlaylistBookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT playlist_id, playlist_name, thumbnail_url, uploader, uploader_url,
                    uploader_avatar, videos
             FROM playlist_bookmarks ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PlaylistBookmark {
                playlist_id: row.get(0)?,
                playlist_name: row.get(1)?,
                thumbnail_url: row.get(2)?,
                uploader: row.get(3)?,
                uploader_url: row.get(4)?,
                uploader_avatar: row.get(5)?,
                videos: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn search_history(&self) -> Result<Vec<SearchHistoryItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT query FROM search_history ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| Ok(SearchHistoryItem { query: row.get(0)? }))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn subscription_groups(&self) -> Result<Vec<SubscriptionGroup>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, channels, sort_index FROM subscription_groups ORDER BY sort_index, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            let channels: String = row.get(1)?;
            let channels = serde_json::from_str(&channels).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(SubscriptionGroup {
                name: row.get(0)?,
                channels,
                index: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn subscriptions(&self) -> Result<Vec<LocalSubscription>> {
        let mut stmt = self.conn.prepare(
            "SELECT channel_id, name, avatar, verified FROM subscriptions ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LocalSubscription {
                channel_id: row.get(0)?,
                name: row.get(1)?,
                avatar: row.get(2)?,
                verified: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn local_playlists(&self) -> Result<Vec<LocalPlaylistWithVideos>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, thumbnail_url, description FROM local_playlists ORDER BY id",
        )?;
        let playlists: Vec<LocalPlaylist> = stmt
            .query_map([], |row| {
                Ok(LocalPlaylist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    thumbnail_url: row.get(2)?,
                    description: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        let mut items = self.conn.prepare(
            "SELECT id, playlist_id, video_id, title, upload_date, uploader, uploader_url,
                    uploader_avatar, thumbnail_url, duration
             FROM local_playlist_items WHERE playlist_id = ?1 ORDER BY id",
        )?;

        let mut result = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let videos = items
                .query_map([playlist.id], map_playlist_item)?
                .collect::<rusqlite::Result<_>>()?;
            result.push(LocalPlaylistWithVideos { playlist, videos });
        }
        Ok(result)
    }
}

// ======================
// Writes (for import)
// ======================

impl LocalStoreMutator for SqliteStorage {
    fn upsert_watch_history(&mut self, items: &[WatchHistoryItem]) -> Result<EntityStats> {
        self.transaction("upsert_watch_history", |tx| {
            let mut stats = EntityStats::default();
            for item in items {
                let existed = row_exists(
                    tx,
                    "SELECT 1 FROM watch_history WHERE video_id = ?1",
                    &item.video_id,
                )?;
                tx.execute(
                    "INSERT INTO watch_history (video_id, title, upload_date, uploader, uploader_url,
                                                uploader_avatar, thumbnail_url, duration, last_watched)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(video_id) DO UPDATE SET
                       title = excluded.title,
                       upload_date = excluded.upload_date,
                       uploader = excluded.uploader,
                       uploader_url = excluded.uploader_url,
                       uploader_avatar = excluded.uploader_avatar,
                       thumbnail_url = excluded.thumbnail_url,
                       duration = excluded.duration,
                       last_watched = excluded.last_watched",
                    rusqlite::params![
                        item.video_id,
                        item.title,
                        item.upload_date,
                        item.uploader,
                        item.uploader_url,
                        item.uploader_avatar,
                        item.thumbnail_url,
                        item.duration,
                        item.current_time,
                    ],
                )?;
                stats.record_upsert(existed);
            }
            Ok(stats)
        })
    }

    fn upsert_watch_positions(&mut self, items: &[WatchPosition]) -> Result<EntityStats> {
        self.transaction("upsert_watch_positions", |tx| {
            let mut stats = EntityStats::default();
            for item in items {
                let existed = row_exists(
                    tx,
                    "SELECT 1 FROM watch_positions WHERE video_id = ?1",
                    &item.video_id,
                )?;
                tx.execute(
                    "INSERT INTO watch_positions (video_id, position) VALUES (?1, ?2)
                     ON CONFLICT(video_id) DO UPDATE SET position = excluded.position",
                    rusqlite::params![item.video_id, item.position],
                )?;
                stats.record_upsert(existed);
            }
            Ok(stats)
        })
    }

    fn upsert_playlist_bookmarks(&mut self, items: &[PlaylistBookmark]) -> Result<EntityStats> {
        self.transaction("upsert_playlist_bookmarks", |tx| {
            let mut stats = EntityStats::default();
            for item in items {
                let existed = row_exists(
                    tx,
                    "SELECT 1 FROM playlist_bookmarks WHERE playlist_id = ?1",
                    &item.playlist_id,
                )?;
                tx.execute(
                    "INSERT INTO playlist_bookmarks (playlist_id, playlist_name, thumbnail_url,
                                                     uploader, uploader_url, uploader_avatar, videos)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(playlist_id) DO UPDATE SET
                       playlist_name = excluded.playlist_name,
                       thumbnail_url = excluded.thumbnail_url,
                       uploader = excluded.uploader,
                       uploader_url = excluded.uploader_url,
                       uploader_avatar = excluded.uploader_avatar,
                       videos = excluded.videos",
                    rusqlite::params![
                        item.playlist_id,
                        item.playlist_name,
                        item.thumbnail_url,
                        item.uploader,
                        item.uploader_url,
                        item.uploader_avatar,
                        item.videos,
                    ],
                )?;
                stats.record_upsert(existed);
            }
            Ok(stats)
        })
    }

    fn upsert_search_history(&mut self, items: &[SearchHistoryItem]) -> Result<EntityStats> {
        self.transaction("upsert_search_history", |tx| {
            let mut stats = EntityStats::default();
            for item in items {
                let existed = row_exists(
                    tx,
                    "SELECT 1 FROM search_history WHERE query = ?1",
                    &item.query,
                )?;
                // Only column is the key, so replacing is a no-op
                tx.execute(
                    "INSERT INTO search_history (query) VALUES (?1) ON CONFLICT(query) DO NOTHING",
                    [&item.query],
                )?;
                stats.record_upsert(existed);
            }
            Ok(stats)
        })
    }

    fn upsert_subscription_groups(&mut self, items: &[SubscriptionGroup]) -> Result<EntityStats> {
        self.transaction("upsert_subscription_groups", |tx| {
            let mut stats = EntityStats::default();
            for item in items {
                let existed = row_exists(
                    tx,
                    "SELECT 1 FROM subscription_groups WHERE name = ?1",
                    &item.name,
                )?;
                let channels = serde_json::to_string(&item.channels)?;
                tx.execute(
                    "INSERT INTO subscription_groups (name, channels, sort_index) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET
                       channels = excluded.channels,
                       sort_index = excluded.sort_index",
                    rusqlite::params![item.name, channels, item.index],
                )?;
                stats.record_upsert(existed);
            }
            Ok(stats)
        })
    }

    fn upsert_subscriptions(&mut self, items: &[LocalSubscription]) -> Result<EntityStats> {
        self.transaction("upsert_subscriptions", |tx| {
            let mut stats = EntityStats::default();
            for item in items {
                let existed = row_exists(
                    tx,
                    "SELECT 1 FROM subscriptions WHERE channel_id = ?1",
                    &item.channel_id,
                )?;
                tx.execute(
                    "INSERT INTO subscriptions (channel_id, name, avatar, verified)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(channel_id) DO UPDATE SET
                       name = excluded.name,
                       avatar = excluded.avatar,
                       verified = excluded.verified",
                    rusqlite::params![item.channel_id, item.name, item.avatar, item.verified],
                )?;
                stats.record_upsert(existed);
            }
            Ok(stats)
        })
    }

    fn find_playlist_by_name(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM local_playlists WHERE name = ?1 ORDER BY id LIMIT 1",
                [name],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn create_playlist(&mut self, playlist: &LocalPlaylist) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO local_playlists (name, thumbnail_url, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![playlist.name, playlist.thumbnail_url, playlist.description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_playlist_video(
        &mut self,
        playlist_id: i64,
        video: &LocalPlaylistItem,
    ) -> Result<i64> {
        let inserted = self.conn.execute(
            "INSERT INTO local_playlist_items (playlist_id, video_id, title, upload_date, uploader,
                                               uploader_url, uploader_avatar, thumbnail_url, duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                playlist_id,
                video.video_id,
                video.title,
                video.upload_date,
                video.uploader,
                video.uploader_url,
                video.uploader_avatar,
                video.thumbnail_url,
                video.duration,
            ],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(Error::DuplicateVideo {
                playlist_id,
                video_id: video.video_id.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::events::EventType;
    use tempfile::TempDir;

    #[test]
    fn test_open_existing_requires_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.db");

        let result = SqliteStorage::open_existing(&path);
        assert!(matches!(result, Err(Error::NotInitialized { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_upsert_replaces_by_key() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let stats = storage
            .upsert_watch_positions(&[WatchPosition::new("x", 10), WatchPosition::new("y", 5)])
            .unwrap();
        assert_eq!(stats.created, 2);

        let stats = storage
            .upsert_watch_positions(&[WatchPosition::new("x", 50)])
            .unwrap();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 1);

        let positions = storage.watch_positions().unwrap();
        assert_eq!(
            positions,
            vec![WatchPosition::new("x", 50), WatchPosition::new("y", 5)]
        );
    }

    #[test]
    fn test_watch_history_round_trip() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut item = WatchHistoryItem::new("a");
        item.title = Some("Intro".into());
        item.duration = Some(300);
        item.current_time = Some(1_700_000_000_000);

        storage.upsert_watch_history(&[item.clone()]).unwrap();
        assert_eq!(storage.watch_history().unwrap(), vec![item.clone()]);

        item.current_time = Some(1_700_000_500_000);
        let stats = storage.upsert_watch_history(&[item.clone()]).unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(storage.watch_history().unwrap(), vec![item]);
    }

    #[test]
    fn test_bookmarks_and_subscriptions_round_trip() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut bookmark = PlaylistBookmark::new("PL1", "Mix");
        bookmark.uploader = Some("someone".into());
        bookmark.videos = 12;
        let mut subscription = LocalSubscription::new("UC1");
        subscription.name = Some("Channel".into());
        subscription.verified = true;

        storage.upsert_playlist_bookmarks(&[bookmark.clone()]).unwrap();
        storage.upsert_subscriptions(&[subscription.clone()]).unwrap();

        assert_eq!(storage.playlist_bookmarks().unwrap(), vec![bookmark]);
        assert_eq!(storage.subscriptions().unwrap(), vec![subscription]);
    }

    #[test]
    fn test_subscription_group_channels_round_trip() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let group = SubscriptionGroup::new("Music", vec!["UC1".into(), "UC2".into()]);

        storage.upsert_subscription_groups(&[group.clone()]).unwrap();

        assert_eq!(storage.subscription_groups().unwrap(), vec![group]);
    }

    #[test]
    fn test_search_history_upsert_is_idempotent() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let items = [SearchHistoryItem::new("rust"), SearchHistoryItem::new("sqlite")];

        storage.upsert_search_history(&items).unwrap();
        let stats = storage.upsert_search_history(&items).unwrap();

        assert_eq!(stats.updated, 2);
        assert_eq!(storage.search_history().unwrap().len(), 2);
    }

    #[test]
    fn test_playlist_videos_and_duplicates() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage.create_playlist(&LocalPlaylist::new("Trip")).unwrap();

        storage
            .insert_playlist_video(id, &LocalPlaylistItem::new("a").with_title("A"))
            .unwrap();
        storage
            .insert_playlist_video(id, &LocalPlaylistItem::new("b"))
            .unwrap();

        let dup = storage.insert_playlist_video(id, &LocalPlaylistItem::new("a"));
        match dup {
            Err(Error::DuplicateVideo {
                playlist_id,
                video_id,
            }) => {
                assert_eq!(playlist_id, id);
                assert_eq!(video_id, "a");
            }
            other => panic!("expected DuplicateVideo, got {other:?}"),
        }

        let playlists = storage.local_playlists().unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].video_ids(), vec!["a", "b"]);
        assert_eq!(playlists[0].videos[0].playlist_id, id);
        assert_eq!(playlists[0].videos[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_insert_into_missing_playlist_is_not_a_duplicate() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let result = storage.insert_playlist_video(999, &LocalPlaylistItem::new("a"));
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[test]
    fn test_find_playlist_by_name_prefers_oldest() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        assert_eq!(storage.find_playlist_by_name("Mix").unwrap(), None);

        let first = storage.create_playlist(&LocalPlaylist::new("Mix")).unwrap();
        let second = storage.create_playlist(&LocalPlaylist::new("Mix")).unwrap();
        assert_ne!(first, second);

        assert_eq!(storage.find_playlist_by_name("Mix").unwrap(), Some(first));
    }

    #[test]
    fn test_collection_counts_and_events() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .upsert_watch_history(&[WatchHistoryItem::new("a"), WatchHistoryItem::new("b")])
            .unwrap();
        storage
            .upsert_subscriptions(&[LocalSubscription::new("UC1")])
            .unwrap();
        let id = storage.create_playlist(&LocalPlaylist::new("P")).unwrap();
        storage
            .insert_playlist_video(id, &LocalPlaylistItem::new("v"))
            .unwrap();

        let counts = storage.collection_counts().unwrap();
        assert_eq!(counts.watch_history, 2);
        assert_eq!(counts.subscriptions, 1);
        assert_eq!(counts.local_playlists, 1);
        assert_eq!(counts.playlist_videos, 1);

        storage
            .record_event(&Event::new(EventType::SnapshotImported))
            .unwrap();
        assert_eq!(storage.recent_events(5).unwrap().len(), 1);
    }
}
