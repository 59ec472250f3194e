//! Running sync in the background.
//!
//! [`SyncSupervisor`] owns everything a run needs (database path, sync
//! directory, strategy) so runs can be started from async code, e.g. when
//! the app is dismissed. Each run opens its own connection on tokio's
//! blocking pool, and runs started through one supervisor never overlap.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::storage::events::{Event, EventType};
use crate::storage::SqliteStorage;
use crate::sync::export::Exporter;
use crate::sync::import::Importer;
use crate::sync::types::{
    ExportStats, ImportStats, MergeStrategy, SyncError, SyncOutcome, SyncResult,
};

/// Serializes export and import runs against one library and sync directory.
#[derive(Debug, Clone)]
pub struct SyncSupervisor {
    db_path: PathBuf,
    sync_dir: Option<PathBuf>,
    strategy: MergeStrategy,
    gate: Arc<Mutex<()>>,
}

impl SyncSupervisor {
    /// Create a supervisor for the library at `db_path`.
    #[must_use]
    pub fn new(db_path: PathBuf, sync_dir: Option<PathBuf>) -> Self {
        Self {
            db_path,
            sync_dir,
            strategy: MergeStrategy::default(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Use `strategy` for exports.
    #[must_use]
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Export and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the export fails or its task panics.
    pub async fn export(&self) -> SyncResult<SyncOutcome<ExportStats>> {
        let db_path = self.db_path.clone();
        let sync_dir = self.sync_dir.clone();
        let strategy = self.strategy;

        self.run_exclusive(move || {
            let mut storage = SqliteStorage::open_existing(&db_path)?;
            let result = Exporter::new(&storage, sync_dir.as_deref())
                .with_strategy(strategy)
                .export();
            record_export(&mut storage, &result);
            result
        })
        .await
    }

    /// Import and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the import fails or its task panics.
    pub async fn import(&self) -> SyncResult<SyncOutcome<ImportStats>> {
        let db_path = self.db_path.clone();
        let sync_dir = self.sync_dir.clone();

        self.run_exclusive(move || {
            let mut storage = SqliteStorage::open_existing(&db_path)?;
            let result = Importer::new(&mut storage, sync_dir.as_deref()).import();
            record_import(&mut storage, &result);
            result
        })
        .await
    }

    /// Run `run` on the blocking pool once the gate is free.
    ///
    /// The gate guard moves into the task, so it stays held until `run`
    /// returns even if the caller stops waiting.
    async fn run_exclusive<T, F>(&self, run: F) -> SyncResult<T>
    where
        F: FnOnce() -> SyncResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = Arc::clone(&self.gate).lock_owned().await;

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            run()
        })
        .await
        .map_err(|e| SyncError::Task(e.to_string()))?
    }

    /// Export, giving up on waiting after `deadline`.
    ///
    /// Intended for teardown. A run that misses the deadline keeps going on
    /// the blocking pool until the process exits; the previous snapshot stays
    /// intact because writes are atomic. Later runs on this supervisor wait
    /// for it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DeadlineExceeded`] on timeout, or the export's error.
    pub async fn export_before_exit(
        &self,
        deadline: Duration,
    ) -> SyncResult<SyncOutcome<ExportStats>> {
        match tokio::time::timeout(deadline, self.export()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?deadline, "Export did not finish before exit");
                Err(SyncError::DeadlineExceeded(deadline))
            }
        }
    }
}

/// Record the outcome of an export in the sync event log.
///
/// Failures to record are logged and otherwise ignored.
pub fn record_export(storage: &mut SqliteStorage, result: &SyncResult<SyncOutcome<ExportStats>>) {
    let event = match result {
        Ok(SyncOutcome::Completed(stats)) if stats.unchanged => {
            Event::new(EventType::SnapshotUnchanged).with_detail(format!("{} records", stats.total()))
        }
        Ok(SyncOutcome::Completed(stats)) => {
            info!(added = stats.added(), "Recorded export");
            Event::new(EventType::SnapshotExported).with_detail(format!(
                "{} records ({} new) to {}",
                stats.total(),
                stats.added(),
                stats.path.display()
            ))
        }
        Ok(SyncOutcome::Skipped(reason)) => {
            Event::new(EventType::SyncSkipped).with_detail(format!("export: {reason}"))
        }
        Err(e) => Event::new(EventType::SyncFailed).with_detail(format!("export: {e}")),
    };
    write_event(storage, &event);
}

/// Record the outcome of an import in the sync event log.
///
/// Failures to record are logged and otherwise ignored.
pub fn record_import(storage: &mut SqliteStorage, result: &SyncResult<SyncOutcome<ImportStats>>) {
    let event = match result {
        Ok(SyncOutcome::Completed(stats)) => {
            Event::new(EventType::SnapshotImported).with_detail(format!(
                "{} created, {} updated, {} already present",
                stats.total_created(),
                stats.total_updated(),
                stats.total_conflicts()
            ))
        }
        Ok(SyncOutcome::Skipped(reason)) => {
            Event::new(EventType::SyncSkipped).with_detail(format!("import: {reason}"))
        }
        Err(e) => Event::new(EventType::SyncFailed).with_detail(format!("import: {e}")),
    };
    write_event(storage, &event);
}

fn write_event(storage: &mut SqliteStorage, event: &Event) {
    if let Err(e) = storage.record_event(event) {
        warn!(error = %e, event = event.event_type.as_str(), "Failed to record sync event");
    }
}
