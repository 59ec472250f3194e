//! The shared snapshot document.

use serde::{Deserialize, Serialize};

use super::library::{
    LocalSubscription, PlaylistBookmark, SearchHistoryItem, SubscriptionGroup, WatchHistoryItem,
    WatchPosition,
};
use super::playlist::LocalPlaylistWithVideos;

/// All synchronized collections at a point in time.
///
/// Every collection is optional: an absent or `null` field means "not
/// included", which import treats as "leave local data alone" rather than
/// "delete everything". Export always writes all seven.
///
/// Fields the app writes into full backups (`preferences`, `customInstances`)
/// are ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub watch_history: Option<Vec<WatchHistoryItem>>,
    pub watch_positions: Option<Vec<WatchPosition>>,
    pub search_history: Option<Vec<SearchHistoryItem>>,
    pub playlist_bookmarks: Option<Vec<PlaylistBookmark>>,
    pub groups: Option<Vec<SubscriptionGroup>>,
    pub subscriptions: Option<Vec<LocalSubscription>>,
    pub local_playlists: Option<Vec<LocalPlaylistWithVideos>>,
    /// Legacy remote playlists. Always written empty, never imported.
    #[serde(default)]
    pub playlists: Option<Vec<serde_json::Value>>,
}

impl Snapshot {
    /// A snapshot with every collection absent.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Per-collection record counts (absent counts as zero).
    #[must_use]
    pub fn counts(&self) -> CollectionCounts {
        CollectionCounts {
            watch_history: len_of(self.watch_history.as_ref()),
            watch_positions: len_of(self.watch_positions.as_ref()),
            search_history: len_of(self.search_history.as_ref()),
            playlist_bookmarks: len_of(self.playlist_bookmarks.as_ref()),
            groups: len_of(self.groups.as_ref()),
            subscriptions: len_of(self.subscriptions.as_ref()),
            local_playlists: len_of(self.local_playlists.as_ref()),
            playlist_videos: self
                .local_playlists
                .as_ref()
                .map_or(0, |p| p.iter().map(|p| p.videos.len()).sum()),
        }
    }
}

fn len_of<T>(items: Option<&Vec<T>>) -> usize {
    items.map_or(0, Vec::len)
}

/// Record counts for each synchronized collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub watch_history: usize,
    pub watch_positions: usize,
    pub search_history: usize,
    pub playlist_bookmarks: usize,
    pub groups: usize,
    pub subscriptions: usize,
    pub local_playlists: usize,
    /// Videos across all local playlists.
    pub playlist_videos: usize,
}

impl CollectionCounts {
    /// Total records, counting playlist videos individually.
    #[must_use]
    pub fn total(&self) -> usize {
        self.watch_history
            + self.watch_positions
            + self.search_history
            + self.playlist_bookmarks
            + self.groups
            + self.subscriptions
            + self.local_playlists
            + self.playlist_videos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_fields_serialize_as_null() {
        let json = serde_json::to_value(Snapshot::empty()).unwrap();

        assert!(json["watchHistory"].is_null());
        assert!(json["localPlaylists"].is_null());
        assert!(json["groups"].is_null());
    }

    #[test]
    fn test_decode_ignores_backup_only_fields() {
        let raw = r#"{
            "watchPositions": [{"videoId": "a", "position": 10}],
            "preferences": [{"key": "theme", "value": "dark"}],
            "customInstances": []
        }"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();

        assert_eq!(snapshot.watch_positions, Some(vec![WatchPosition::new("a", 10)]));
        assert!(snapshot.watch_history.is_none());
        assert!(snapshot.playlists.is_none());
    }

    #[test]
    fn test_counts() {
        let snapshot = Snapshot {
            search_history: Some(vec![SearchHistoryItem::new("rust")]),
            local_playlists: Some(vec![
                LocalPlaylistWithVideos::named("A", ["1", "2"]),
                LocalPlaylistWithVideos::named("B", ["3"]),
            ]),
            ..Snapshot::empty()
        };

        let counts = snapshot.counts();
        assert_eq!(counts.search_history, 1);
        assert_eq!(counts.local_playlists, 2);
        assert_eq!(counts.playlist_videos, 3);
        assert_eq!(counts.total(), 6);
    }
}
