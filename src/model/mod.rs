//! Data models for the library and its snapshot.
//!
//! - Flat records: watch history, watch positions, playlist bookmarks,
//!   search history, subscription groups, subscriptions
//! - Playlists: local playlists with their videos
//! - Snapshot: the shared document holding all seven collections

pub mod library;
pub mod playlist;
pub mod snapshot;

pub use library::{
    LocalSubscription, PlaylistBookmark, SearchHistoryItem, SubscriptionGroup, WatchHistoryItem,
    WatchPosition,
};
pub use playlist::{LocalPlaylist, LocalPlaylistItem, LocalPlaylistWithVideos};
pub use snapshot::{CollectionCounts, Snapshot};
