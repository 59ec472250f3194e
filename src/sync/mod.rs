//! Snapshot sync operations.
//!
//! Devices share state through one JSON snapshot in a directory they can all
//! reach (a synced folder, a removable drive):
//!
//! - **Export**: stored snapshot + local library → merged snapshot
//! - **Import**: snapshot → local library, insert-or-replace by key
//! - **Merge**: key-deduplicating merges with an explicit precedence
//! - **Lifecycle**: serialized background runs with a teardown deadline
//! - **Status**: snapshot vs. local counts and recent runs
//!
//! # Example
//!
//! ```ignore
//! use autosync::sync::{Exporter, Importer, MergeStrategy};
//!
//! let outcome = Exporter::new(&storage, Some(dir))
//!     .with_strategy(MergeStrategy::PreferBase)
//!     .export()?;
//!
//! let outcome = Importer::new(&mut storage, Some(dir)).import()?;
//! ```

mod export;
mod file;
mod hash;
mod import;
mod lifecycle;
mod merge;
mod snapshot;
mod status;
mod types;

// Re-export main types and functions
pub use export::Exporter;
pub use file::{atomic_write, file_size, is_writable_dir};
pub use hash::content_hash;
pub use import::Importer;
pub use lifecycle::{record_export, record_import, SyncSupervisor};
pub use merge::{merge_by_key, merge_playlists};
pub use snapshot::{SnapshotStore, SNAPSHOT_FILE_NAME};
pub use status::{get_sync_status, print_status};
pub use types::{
    EntityStats, ExportStats, ImportStats, MergeStrategy, SkipReason, SyncError, SyncOutcome,
    SyncResult, SyncStatus,
};
