//! User-created playlists.
//!
//! A playlist is a parent record (matched across devices by name) holding an
//! ordered set of videos (matched by video id within that playlist). The
//! numeric ids on both are local sequence numbers: they are serialized for
//! compatibility but never used to match records between devices.

use serde::{Deserialize, Serialize};

/// Playlist metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPlaylist {
    /// Local row id. Reassigned on import.
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl LocalPlaylist {
    /// Create playlist metadata that has not been stored yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            thumbnail_url: None,
            description: None,
        }
    }
}

/// A video inside a local playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPlaylistItem {
    /// Local row id. Reassigned on import.
    #[serde(default)]
    pub id: i64,
    /// Local id of the owning playlist. Reassigned on import.
    #[serde(default)]
    pub playlist_id: i64,
    pub video_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub uploader_url: Option<String>,
    #[serde(default)]
    pub uploader_avatar: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

impl LocalPlaylistItem {
    #[must_use]
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            id: 0,
            playlist_id: 0,
            video_id: video_id.into(),
            title: None,
            upload_date: None,
            uploader: None,
            uploader_url: None,
            uploader_avatar: None,
            thumbnail_url: None,
            duration: None,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A playlist together with its videos, as stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPlaylistWithVideos {
    pub playlist: LocalPlaylist,
    #[serde(default)]
    pub videos: Vec<LocalPlaylistItem>,
}

impl LocalPlaylistWithVideos {
    /// Build a playlist named `name` holding videos with the given ids.
    #[must_use]
    pub fn named<I, S>(name: &str, video_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            playlist: LocalPlaylist::new(name),
            videos: video_ids.into_iter().map(LocalPlaylistItem::new).collect(),
        }
    }

    /// Playlist name, the cross-device key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.playlist.name
    }

    /// Video ids in playlist order.
    #[must_use]
    pub fn video_ids(&self) -> Vec<&str> {
        self.videos.iter().map(|v| v.video_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_json_shape() {
        let playlist = LocalPlaylistWithVideos::named("Trip", ["a", "b"]);
        let json = serde_json::to_value(&playlist).unwrap();

        assert_eq!(json["playlist"]["name"], "Trip");
        assert_eq!(json["videos"][1]["videoId"], "b");
        assert_eq!(json["videos"][0]["playlistId"], 0);
    }

    #[test]
    fn test_decode_without_local_ids() {
        let raw = r#"{"playlist":{"name":"Road"},"videos":[{"videoId":"v1","title":"One"}]}"#;
        let playlist: LocalPlaylistWithVideos = serde_json::from_str(raw).unwrap();

        assert_eq!(playlist.name(), "Road");
        assert_eq!(playlist.playlist.id, 0);
        assert_eq!(playlist.video_ids(), vec!["v1"]);
        assert_eq!(playlist.videos[0].title.as_deref(), Some("One"));
    }
}
