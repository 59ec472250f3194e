//! Database schema for the local library.
//!
//! One table per synchronized collection, keyed by that collection's merge
//! key so insert-or-replace can be delegated to SQLite. Playlists and their
//! videos use autoincrement ids that are meaningful on this device only.

use rusqlite::{Connection, Result};

/// The complete SQL schema for the library database.
///
/// Timestamps are stored as INTEGER (Unix milliseconds).
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Flat collections
-- ====================

CREATE TABLE IF NOT EXISTS watch_history (
    video_id TEXT PRIMARY KEY,
    title TEXT,
    upload_date TEXT,
    uploader TEXT,
    uploader_url TEXT,
    uploader_avatar TEXT,
    thumbnail_url TEXT,
    duration INTEGER,
    -- currentTime in the document; unix millis of the last open
    last_watched INTEGER
);

CREATE TABLE IF NOT EXISTS watch_positions (
    video_id TEXT PRIMARY KEY,
    position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS playlist_bookmarks (
    playlist_id TEXT PRIMARY KEY,
    playlist_name TEXT,
    thumbnail_url TEXT,
    uploader TEXT,
    uploader_url TEXT,
    uploader_avatar TEXT,
    videos INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS search_history (
    query TEXT PRIMARY KEY
);

-- channels: JSON array of channel ids
CREATE TABLE IF NOT EXISTS subscription_groups (
    name TEXT PRIMARY KEY,
    channels TEXT NOT NULL DEFAULT '[]',
    sort_index INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS subscriptions (
    channel_id TEXT PRIMARY KEY,
    name TEXT,
    avatar TEXT,
    verified INTEGER NOT NULL DEFAULT 0
);

-- ====================
-- Playlists
-- ====================

-- Names are not unique locally; sync matches on the lowest id per name.
CREATE TABLE IF NOT EXISTS local_playlists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    thumbnail_url TEXT,
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_local_playlists_name ON local_playlists(name);

CREATE TABLE IF NOT EXISTS local_playlist_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    playlist_id INTEGER NOT NULL,
    video_id TEXT NOT NULL,
    title TEXT,
    upload_date TEXT,
    uploader TEXT,
    uploader_url TEXT,
    uploader_avatar TEXT,
    thumbnail_url TEXT,
    duration INTEGER,
    FOREIGN KEY (playlist_id) REFERENCES local_playlists(id) ON DELETE CASCADE,
    UNIQUE(playlist_id, video_id)
);

CREATE INDEX IF NOT EXISTS idx_local_playlist_items_playlist ON local_playlist_items(playlist_id);

-- ====================
-- Sync event log
-- ====================

CREATE TABLE IF NOT EXISTS sync_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    detail TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sync_events_created ON sync_events(created_at DESC);
";

/// Apply the schema to a database connection.
///
/// Safe to call on every open: all statements are `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "watch_history",
            "watch_positions",
            "playlist_bookmarks",
            "search_history",
            "subscription_groups",
            "subscriptions",
            "local_playlists",
            "local_playlist_items",
            "sync_events",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
    }

    #[test]
    fn test_playlist_video_unique_per_playlist() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        conn.execute("INSERT INTO local_playlists (name) VALUES ('A')", []).unwrap();
        conn.execute("INSERT INTO local_playlists (name) VALUES ('B')", []).unwrap();

        let insert = "INSERT INTO local_playlist_items (playlist_id, video_id) VALUES (?1, ?2)";
        assert!(conn.execute(insert, rusqlite::params![1, "v1"]).is_ok());
        // Same video in another playlist is fine
        assert!(conn.execute(insert, rusqlite::params![2, "v1"]).is_ok());
        // Same video twice in one playlist is not
        assert!(conn.execute(insert, rusqlite::params![1, "v1"]).is_err());
    }
}
