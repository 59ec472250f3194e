//! Error types for the autosync CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=conflict, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for autosync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Conflict (exit 3)
    DuplicateVideo,

    // Validation (exit 4)
    InvalidArgument,
    LocationUnavailable,

    // Sync (exit 6)
    SyncError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::DuplicateVideo => "DUPLICATE_VIDEO",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::LocationUnavailable => "LOCATION_UNAVAILABLE",
            Self::SyncError => "SYNC_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::DuplicateVideo => 3,
            Self::InvalidArgument | Self::LocationUnavailable => 4,
            Self::SyncError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying with corrected input can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::LocationUnavailable | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in autosync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: no library database at {path}")]
    NotInitialized { path: PathBuf },

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    /// A playlist already holds this video. Raised by the store when a
    /// playlist video insert hits the `(playlist_id, video_id)` constraint.
    #[error("Video {video_id} is already in playlist {playlist_id}")]
    DuplicateVideo { playlist_id: i64, video_id: String },

    #[error("Sync location is not a writable directory: {path}")]
    LocationUnavailable { path: PathBuf },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sync failed: {0}")]
    Sync(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized { .. } => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::DuplicateVideo { .. } => ErrorCode::DuplicateVideo,
            Self::LocationUnavailable { .. } => ErrorCode::LocationUnavailable,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Sync(_) => ErrorCode::SyncError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether this is a playlist video conflict that import absorbs.
    #[must_use]
    pub const fn is_duplicate_video(&self) -> bool {
        matches!(self, Self::DuplicateVideo { .. })
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized { path } => Some(format!(
                "Run `autosync init` to create the library database at {}",
                path.display()
            )),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::LocationUnavailable { path } => Some(format!(
                "Create {} or pick another folder with `autosync location set <dir>`",
                path.display()
            )),

            Self::Config(_) => Some(
                "Set AUTOSYNC_CONFIG_DIR or pass --db/--dir explicitly".to_string(),
            ),

            Self::DuplicateVideo { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Sync(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized { path: "/x".into() }.exit_code(), 2);
        assert_eq!(
            Error::DuplicateVideo { playlist_id: 1, video_id: "a".into() }.exit_code(),
            3
        );
        assert_eq!(Error::InvalidArgument("bad".into()).exit_code(), 4);
        assert_eq!(Error::Sync("boom".into()).exit_code(), 6);
        assert_eq!(Error::Other("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::LocationUnavailable { path: "/mnt/sync".into() };
        let json = err.to_structured_json();

        assert_eq!(json["error"]["code"], "LOCATION_UNAVAILABLE");
        assert_eq!(json["error"]["exit_code"], 4);
        assert_eq!(json["error"]["retryable"], true);
        assert!(json["error"]["hint"].as_str().unwrap().contains("/mnt/sync"));
    }

    #[test]
    fn test_duplicate_video_detection() {
        let dup = Error::DuplicateVideo { playlist_id: 7, video_id: "v".into() };
        assert!(dup.is_duplicate_video());
        assert!(dup.to_structured_json()["error"].get("hint").is_none());
        assert!(!Error::Other("x".into()).is_duplicate_video());
    }
}
