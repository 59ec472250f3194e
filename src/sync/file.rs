//! Atomic file operations for sync.
//!
//! A snapshot is replaced by writing a uniquely named temporary file next to
//! it, syncing that to disk, then renaming it over the target. Readers on any
//! device see either the previous document or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::sync::types::SyncResult;

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to `.<name>.<uuid>.tmp` in the target's directory
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched and the
/// temporary file is removed.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> SyncResult<()> {
    let file_name = path
        .file_name()
        .map_or_else(|| "snapshot".into(), |n| n.to_string_lossy());
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = write_synced(&temp_path, content).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content)?;
    writer.flush()?;
    // Sync to disk before rename
    writer.get_ref().sync_all()
}

/// Whether `dir` is an existing directory we may write into.
///
/// Permission bits alone don't answer this (ownership, ACLs, read-only
/// mounts), so a throwaway file is created and removed.
#[must_use]
pub fn is_writable_dir(dir: &Path) -> bool {
    if !fs::metadata(dir).is_ok_and(|m| m.is_dir()) {
        return false;
    }

    let check_path = dir.join(format!(".autosync-check.{}.tmp", uuid::Uuid::new_v4()));
    match OpenOptions::new().write(true).create_new(true).open(&check_path) {
        Ok(file) => {
            drop(file);
            let _ = fs::remove_file(&check_path);
            true
        }
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Sync directory is not writable");
            false
        }
    }
}

/// Get the size of a file in bytes.
///
/// Returns 0 if the file doesn't exist.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("autosync.json");

        atomic_write(&path, b"{\"a\":1}").unwrap();
        atomic_write(&path, b"{\"a\":2}").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"a\":2}");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("autosync.json");

        atomic_write(&path, b"{}").unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("autosync.json")]);
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("autosync.json");

        atomic_write(&path, b"{}").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_is_writable_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(is_writable_dir(temp_dir.path()));
        assert!(!is_writable_dir(&file));
        assert!(!is_writable_dir(&temp_dir.path().join("missing")));

        // The check leaves nothing behind
        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("file.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_is_writable_dir_agrees_with_a_real_write() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users can still write here, so compare with an actual attempt
        let reported = is_writable_dir(&locked);
        let actual = fs::write(locked.join("x"), "x").is_ok();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(reported, actual);
    }

    #[test]
    fn test_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("f");

        assert_eq!(file_size(&path), 0);
        fs::write(&path, "12345").unwrap();
        assert_eq!(file_size(&path), 5);
    }
}
