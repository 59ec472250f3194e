//! Sync location commands.

use crate::cli::LocationCommands;
use crate::config::{require_settings_path, Settings};
use crate::error::Result;
use std::path::Path;

/// Execute location commands.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or written, or if
/// `set` is given a directory that is missing or read-only.
pub fn execute(command: &LocationCommands, json: bool) -> Result<()> {
    let settings_path = require_settings_path()?;
    match command {
        LocationCommands::Set { dir } => set(&settings_path, dir, json),
        LocationCommands::Show => show(&settings_path, json),
        LocationCommands::Clear => clear(&settings_path, json),
    }
}

fn set(settings_path: &Path, dir: &Path, json: bool) -> Result<()> {
    let mut settings = Settings::load_from(settings_path)?;
    let previous = settings.sync_dir.clone();
    let location = settings.set_sync_dir(dir)?.to_path_buf();
    settings.save_to(settings_path)?;

    if json {
        let output = serde_json::json!({
            "location": location,
            "previous": previous,
        });
        println!("{output}");
    } else {
        println!("Sync location set to {}", location.display());
        if let Some(previous) = previous.filter(|p| *p != location) {
            println!("  (was {})", previous.display());
        }
    }
    Ok(())
}

fn show(settings_path: &Path, json: bool) -> Result<()> {
    let settings = Settings::load_from(settings_path)?;

    if json {
        let output = serde_json::json!({ "location": settings.sync_dir });
        println!("{output}");
    } else if let Some(dir) = &settings.sync_dir {
        println!("{}", dir.display());
    } else {
        println!("No sync location configured.");
    }
    Ok(())
}

fn clear(settings_path: &Path, json: bool) -> Result<()> {
    let mut settings = Settings::load_from(settings_path)?;
    let previous = settings.clear_sync_dir();
    settings.save_to(settings_path)?;

    if json {
        let output = serde_json::json!({ "cleared": previous });
        println!("{output}");
    } else if let Some(previous) = previous {
        println!("Forgot sync location {}", previous.display());
    } else {
        println!("No sync location was configured.");
    }
    Ok(())
}
