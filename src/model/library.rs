//! Flat library records.
//!
//! Each record kind has a merge key that identifies it across devices.
//! Field names serialize in camelCase so snapshot files stay compatible with
//! the app's own backup format.

use serde::{Deserialize, Serialize};

/// A watched video. Keyed by `video_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryItem {
    pub video_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// ISO date (`YYYY-MM-DD`) as published by the uploader.
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
    /// Length in seconds.
    #[serde(default)]
    pub duration: Option<i64>,
    /// Unix milliseconds of the last time the video was opened.
    #[serde(default)]
    pub current_time: Option<i64>,
}

impl WatchHistoryItem {
    /// Create an entry with only the video id set.
    #[must_use]
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: None,
            upload_date: None,
            uploader: None,
            uploader_url: None,
            uploader_avatar: None,
            thumbnail_url: None,
            duration: None,
            current_time: None,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Resume position for a video. Keyed by `video_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPosition {
    pub video_id: String,
    /// Position in milliseconds.
    pub position: i64,
}

impl WatchPosition {
    #[must_use]
    pub fn new(video_id: impl Into<String>, position: i64) -> Self {
        Self {
            video_id: video_id.into(),
            position,
        }
    }
}

/// A bookmarked remote playlist. Keyed by `playlist_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistBookmark {
    pub playlist_id: String,
    #[serde(default)]
    pub playlist_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub uploader_url: Option<String>,
    #[serde(default)]
    pub uploader_avatar: Option<String>,
    /// Number of videos in the remote playlist when it was bookmarked.
    #[serde(default)]
    pub videos: i64,
}

impl PlaylistBookmark {
    #[must_use]
    pub fn new(playlist_id: impl Into<String>, playlist_name: impl Into<String>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            playlist_name: Some(playlist_name.into()),
            thumbnail_url: None,
            uploader: None,
            uploader_url: None,
            uploader_avatar: None,
            videos: 0,
        }
    }
}

/// A past search. Keyed by the query text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryItem {
    pub query: String,
}

impl SearchHistoryItem {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// A named group of subscribed channels. Keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionGroup {
    pub name: String,
    /// Channel ids in display order.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Sort position among groups.
    #[serde(default)]
    pub index: i64,
}

impl SubscriptionGroup {
    #[must_use]
    pub fn new(name: impl Into<String>, channels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            channels,
            index: 0,
        }
    }
}

/// A followed channel. Keyed by `channel_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSubscription {
    pub channel_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl LocalSubscription {
    #[must_use]
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            name: None,
            avatar: None,
            verified: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_history_uses_camel_case() {
        let item = WatchHistoryItem::new("abc").with_title("Intro");
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["videoId"], "abc");
        assert_eq!(json["title"], "Intro");
        assert!(json.get("video_id").is_none());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let item: WatchHistoryItem = serde_json::from_str(r#"{"videoId":"xyz"}"#).unwrap();
        assert_eq!(item, WatchHistoryItem::new("xyz"));

        let group: SubscriptionGroup = serde_json::from_str(r#"{"name":"Music"}"#).unwrap();
        assert!(group.channels.is_empty());
        assert_eq!(group.index, 0);
    }
}
