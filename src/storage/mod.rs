//! Local library storage.
//!
//! The sync core never talks to SQLite directly. It reads through
//! [`LocalStoreView`] and writes through [`LocalStoreMutator`], both of which
//! [`SqliteStorage`] implements. Tests can substitute their own store.
//!
//! # Submodules
//!
//! - [`events`] - Sync event log
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - SQLite storage implementation

pub mod events;
pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::Result;
use crate::model::{
    LocalPlaylist, LocalPlaylistItem, LocalPlaylistWithVideos, LocalSubscription,
    PlaylistBookmark, SearchHistoryItem, SubscriptionGroup, WatchHistoryItem, WatchPosition,
};
use crate::sync::EntityStats;

/// Read access to the full contents of each synchronized collection.
pub trait LocalStoreView {
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn watch_history(&self) -> Result<Vec<WatchHistoryItem>>;
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn watch_positions(&self) -> Result<Vec<WatchPosition>>;
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn playlist_bookmarks(&self) -> Result<Vec<PlaylistBookmark>>;
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn search_history(&self) -> Result<Vec<SearchHistoryItem>>;
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn subscription_groups(&self) -> Result<Vec<SubscriptionGroup>>;
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn subscriptions(&self) -> Result<Vec<LocalSubscription>>;
    /// Every local playlist with its videos in playlist order.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn local_playlists(&self) -> Result<Vec<LocalPlaylistWithVideos>>;
}

/// Write access used when applying a snapshot.
///
/// The bulk `upsert_*` methods are insert-or-replace keyed by each
/// collection's merge key. None of these methods delete records.
pub trait LocalStoreMutator {
    /// # Errors
    /// Returns an error if the write fails.
    fn upsert_watch_history(&mut self, items: &[WatchHistoryItem]) -> Result<EntityStats>;
    /// # Errors
    /// Returns an error if the write fails.
    fn upsert_watch_positions(&mut self, items: &[WatchPosition]) -> Result<EntityStats>;
    /// # Errors
    /// Returns an error if the write fails.
    fn upsert_playlist_bookmarks(&mut self, items: &[PlaylistBookmark]) -> Result<EntityStats>;
    /// # Errors
    /// Returns an error if the write fails.
    fn upsert_search_history(&mut self, items: &[SearchHistoryItem]) -> Result<EntityStats>;
    /// # Errors
    /// Returns an error if the write fails.
    fn upsert_subscription_groups(&mut self, items: &[SubscriptionGroup]) -> Result<EntityStats>;
    /// # Errors
    /// Returns an error if the write fails.
    fn upsert_subscriptions(&mut self, items: &[LocalSubscription]) -> Result<EntityStats>;

    /// Local id of the playlist called `name`, if one exists.
    ///
    /// # Errors
    /// Returns an error if the lookup fails.
    fn find_playlist_by_name(&self, name: &str) -> Result<Option<i64>>;

    /// Store new playlist metadata and return its freshly assigned id.
    /// The id on `playlist` is ignored.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    fn create_playlist(&mut self, playlist: &LocalPlaylist) -> Result<i64>;

    /// Add one video to a playlist with a freshly assigned id.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateVideo`] if the playlist already holds
    /// the video, or another error if the insert fails.
    fn insert_playlist_video(&mut self, playlist_id: i64, video: &LocalPlaylistItem)
    -> Result<i64>;
}
