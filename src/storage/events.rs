//! Sync event log.
//!
//! One row per export or import run, so `status` can show what happened
//! last on this device.

use rusqlite::{Connection, Result};
use serde::Serialize;

/// Kinds of sync events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SnapshotExported,
    SnapshotUnchanged,
    SnapshotImported,
    SyncSkipped,
    SyncFailed,
}

impl EventType {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SnapshotExported => "snapshot_exported",
            Self::SnapshotUnchanged => "snapshot_unchanged",
            Self::SnapshotImported => "snapshot_imported",
            Self::SyncSkipped => "sync_skipped",
            Self::SyncFailed => "sync_failed",
        }
    }
}

/// A sync event record.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    pub event_type: EventType,
    pub detail: Option<String>,
    pub created_at: i64,
}

impl Event {
    /// Create a new event (id will be assigned by database).
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            id: 0,
            event_type,
            detail: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Attach a human-readable detail line.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Insert an event into the database.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(conn: &Connection, event: &Event) -> Result<i64> {
    conn.execute(
        "INSERT INTO sync_events (event_type, detail, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![event.event_type.as_str(), event.detail, event.created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent events, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_events(conn: &Connection, limit: u32) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, detail, created_at
         FROM sync_events
         ORDER BY created_at DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit], |row| {
        Ok(Event {
            id: row.get(0)?,
            event_type: parse_event_type(row.get::<_, String>(1)?.as_str()),
            detail: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;

    rows.collect()
}

fn parse_event_type(s: &str) -> EventType {
    match s {
        "snapshot_exported" => EventType::SnapshotExported,
        "snapshot_unchanged" => EventType::SnapshotUnchanged,
        "snapshot_imported" => EventType::SnapshotImported,
        "sync_skipped" => EventType::SyncSkipped,
        _ => EventType::SyncFailed,
    }
}
