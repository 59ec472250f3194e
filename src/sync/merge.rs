//! Key-deduplicating merges used when building a snapshot.
//!
//! Both functions are pure. Output order is the order in which each key
//! first appears in `base` followed by `incoming`, so running a merge twice
//! with the same inputs produces byte-identical snapshots.

use std::collections::HashMap;
use std::hash::Hash;

use crate::model::{LocalPlaylist, LocalPlaylistItem, LocalPlaylistWithVideos};
use crate::sync::types::MergeStrategy;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Base,
    Incoming,
}

/// Merge two collections, keeping one record per key.
///
/// Within one side the first occurrence of a key wins. Across sides
/// `strategy` decides; with [`MergeStrategy::PreferIncoming`] the incoming
/// record takes over the base record's position.
pub fn merge_by_key<T, K, F>(
    base: Vec<T>,
    incoming: Vec<T>,
    key_of: F,
    strategy: MergeStrategy,
) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: Vec<(T, Side)> = Vec::with_capacity(base.len() + incoming.len());
    let mut index: HashMap<K, usize> = HashMap::with_capacity(slots.capacity());

    let sides = base
        .into_iter()
        .map(|item| (item, Side::Base))
        .chain(incoming.into_iter().map(|item| (item, Side::Incoming)));

    for (item, side) in sides {
        let key = key_of(&item);
        match index.get(&key) {
            None => {
                index.insert(key, slots.len());
                slots.push((item, side));
            }
            Some(&pos) => {
                let held_by = slots[pos].1;
                let replace = strategy == MergeStrategy::PreferIncoming
                    && held_by == Side::Base
                    && side == Side::Incoming;
                if replace {
                    slots[pos] = (item, side);
                }
            }
        }
    }

    slots.into_iter().map(|(item, _)| item).collect()
}

/// Merge playlists by name, unioning their videos.
///
/// Every playlist sharing a name collapses into one. Its metadata comes from
/// the first playlist of the group (or the first incoming one under
/// [`MergeStrategy::PreferIncoming`]). Its videos are the videos of every
/// playlist in the group, base side first, deduplicated by `videoId`.
pub fn merge_playlists(
    base: Vec<LocalPlaylistWithVideos>,
    incoming: Vec<LocalPlaylistWithVideos>,
    strategy: MergeStrategy,
) -> Vec<LocalPlaylistWithVideos> {
    struct Group {
        metadata: LocalPlaylist,
        metadata_from: Side,
        base_videos: Vec<LocalPlaylistItem>,
        incoming_videos: Vec<LocalPlaylistItem>,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let sides = base
        .into_iter()
        .map(|p| (p, Side::Base))
        .chain(incoming.into_iter().map(|p| (p, Side::Incoming)));

    for (LocalPlaylistWithVideos { playlist, videos }, side) in sides {
        let pos = match index.get(&playlist.name) {
            Some(&pos) => {
                let group = &mut groups[pos];
                if strategy == MergeStrategy::PreferIncoming
                    && group.metadata_from == Side::Base
                    && side == Side::Incoming
                {
                    group.metadata = playlist;
                    group.metadata_from = Side::Incoming;
                }
                pos
            }
            None => {
                index.insert(playlist.name.clone(), groups.len());
                groups.push(Group {
                    metadata: playlist,
                    metadata_from: side,
                    base_videos: Vec::new(),
                    incoming_videos: Vec::new(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[pos];
        match side {
            Side::Base => group.base_videos.extend(videos),
            Side::Incoming => group.incoming_videos.extend(videos),
        }
    }

    groups
        .into_iter()
        .map(|g| LocalPlaylistWithVideos {
            playlist: g.metadata,
            videos: merge_by_key(
                g.base_videos,
                g.incoming_videos,
                |v| v.video_id.clone(),
                strategy,
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WatchPosition;

    fn positions(items: &[(&str, i64)]) -> Vec<WatchPosition> {
        items
            .iter()
            .map(|(id, pos)| WatchPosition::new(*id, *pos))
            .collect()
    }

    fn key(p: &WatchPosition) -> String {
        p.video_id.clone()
    }

    #[test]
    fn test_empty_inputs() {
        let merged = merge_by_key(Vec::new(), Vec::new(), key, MergeStrategy::PreferBase);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_base_wins_on_conflicting_keys() {
        let base = positions(&[("x", 10)]);
        let local = positions(&[("x", 99), ("y", 5)]);

        let merged = merge_by_key(base, local, key, MergeStrategy::PreferBase);

        assert_eq!(merged, positions(&[("x", 10), ("y", 5)]));
    }

    #[test]
    fn test_prefer_incoming_keeps_base_position() {
        let base = positions(&[("a", 1), ("x", 10)]);
        let local = positions(&[("b", 2), ("x", 99)]);

        let merged = merge_by_key(base, local, key, MergeStrategy::PreferIncoming);

        assert_eq!(merged, positions(&[("a", 1), ("x", 99), ("b", 2)]));
    }

    #[test]
    fn test_first_occurrence_wins_within_a_side() {
        let base = positions(&[("x", 1), ("x", 2)]);
        let local = positions(&[("y", 1), ("y", 2)]);

        for strategy in [MergeStrategy::PreferBase, MergeStrategy::PreferIncoming] {
            let merged = merge_by_key(base.clone(), local.clone(), key, strategy);
            assert_eq!(merged, positions(&[("x", 1), ("y", 1)]));
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let base = positions(&[("a", 1), ("b", 2)]);
        let local = positions(&[("b", 3), ("c", 4)]);

        let once = merge_by_key(base, local.clone(), key, MergeStrategy::PreferBase);
        let twice = merge_by_key(once.clone(), local, key, MergeStrategy::PreferBase);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_playlists_union_videos_by_name() {
        let base = vec![LocalPlaylistWithVideos::named("Favorites", ["A", "B"])];
        let local = vec![LocalPlaylistWithVideos::named("Favorites", ["B", "C"])];

        let merged = merge_playlists(base, local, MergeStrategy::PreferBase);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name(), "Favorites");
        assert_eq!(merged[0].video_ids(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_playlists_keep_first_appearance_order() {
        let base = vec![
            LocalPlaylistWithVideos::named("One", ["a"]),
            LocalPlaylistWithVideos::named("Two", ["b"]),
        ];
        let local = vec![
            LocalPlaylistWithVideos::named("Three", ["c"]),
            LocalPlaylistWithVideos::named("One", ["d"]),
        ];

        let merged = merge_playlists(base, local, MergeStrategy::PreferBase);

        let names: Vec<_> = merged.iter().map(LocalPlaylistWithVideos::name).collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
        assert_eq!(merged[0].video_ids(), vec!["a", "d"]);
    }

    #[test]
    fn test_playlist_metadata_follows_strategy() {
        let mut base = LocalPlaylistWithVideos::named("Mix", ["a"]);
        base.playlist.description = Some("from base".into());
        let mut local = LocalPlaylistWithVideos::named("Mix", ["a"]);
        local.playlist.description = Some("from local".into());
        local.videos[0] = LocalPlaylistItem::new("a").with_title("Local title");

        let kept = merge_playlists(vec![base.clone()], vec![local.clone()], MergeStrategy::PreferBase);
        assert_eq!(kept[0].playlist.description.as_deref(), Some("from base"));
        assert_eq!(kept[0].videos[0].title, None);

        let replaced = merge_playlists(vec![base], vec![local], MergeStrategy::PreferIncoming);
        assert_eq!(replaced[0].playlist.description.as_deref(), Some("from local"));
        assert_eq!(replaced[0].videos[0].title.as_deref(), Some("Local title"));
    }

    #[test]
    fn test_same_name_twice_on_one_side_collapses() {
        let local = vec![
            LocalPlaylistWithVideos::named("Trip", ["a", "a"]),
            LocalPlaylistWithVideos::named("Trip", ["b", "a"]),
        ];

        let merged = merge_playlists(Vec::new(), local, MergeStrategy::PreferBase);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].video_ids(), vec!["a", "b"]);
    }
}
