//! Create the library database.
//!
//! The database lives at `~/.autosync/data/library.db` unless `--db` or
//! `AUTOSYNC_DB` points elsewhere. Run this once per device.

use crate::config::require_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    reinitialized: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if the database exists and `force`
/// is not set, or an error if the database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = require_db_path(db_path.map(PathBuf::as_path))?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }
    if existed {
        remove_database(&db_path)?;
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Opening applies the schema
    SqliteStorage::open(&db_path)?;

    if json {
        let output = InitOutput {
            database: db_path,
            reinitialized: existed,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized library database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: Run 'autosync location set <dir>' to choose where the snapshot lives.");
    }

    Ok(())
}

/// Remove a database file and its WAL side files.
fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            fs::remove_file(side)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WatchPosition;
    use crate::storage::{LocalStoreMutator, LocalStoreView};
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_database_with_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("data").join("library.db");

        execute(Some(&db_path), false, true).unwrap();

        assert!(db_path.exists());
        let storage = SqliteStorage::open_existing(&db_path).unwrap();
        assert_eq!(storage.collection_counts().unwrap().total(), 0);
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");

        assert!(execute(Some(&db_path), false, true).is_ok());

        let result = execute(Some(&db_path), false, true);
        assert!(matches!(result, Err(Error::AlreadyInitialized { .. })));
    }

    #[test]
    fn test_init_force_starts_over() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");
        execute(Some(&db_path), false, true).unwrap();
        {
            let mut storage = SqliteStorage::open(&db_path).unwrap();
            storage
                .upsert_watch_positions(&[WatchPosition::new("x", 1)])
                .unwrap();
        }

        execute(Some(&db_path), true, true).unwrap();

        let storage = SqliteStorage::open_existing(&db_path).unwrap();
        assert!(storage.watch_positions().unwrap().is_empty());
    }
}
