//! Status command implementation.

use crate::config::{require_db_path, resolve_sync_dir};
use crate::error::Result;
use crate::storage::SqliteStorage;
use crate::sync::{get_sync_status, print_status};
use std::path::PathBuf;

/// Show snapshot and library status.
///
/// # Errors
///
/// Returns an error if the database is missing or cannot be queried.
pub fn execute(db_path: Option<&PathBuf>, dir: Option<&PathBuf>, json: bool) -> Result<()> {
    let db_path = require_db_path(db_path.map(PathBuf::as_path))?;
    let storage = SqliteStorage::open_existing(&db_path)?;
    let location = resolve_sync_dir(dir.map(PathBuf::as_path))?;

    let status = get_sync_status(&storage, location.as_deref())?;

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}
