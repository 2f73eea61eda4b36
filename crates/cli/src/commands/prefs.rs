//! `prefs` subcommands: remembered upload-on-save answers.

use anyhow::{Context, Result};

use scriptsync_core::{Database, SyncConfig};

use super::style;

fn open_database(config: &SyncConfig) -> Result<Database> {
    Database::open_initialized(config.workspace.database_path())
        .context("failed to open database")
}

/// List remembered answers.
pub fn run_list(config: &SyncConfig) -> Result<()> {
    let db = open_database(config)?;
    let prefs = db
        .list_upload_preferences()
        .context("failed to list upload preferences")?;

    if prefs.is_empty() {
        println!("{}", style::dim("No remembered upload preferences"));
        return Ok(());
    }

    for p in &prefs {
        println!("{:<30} {:<8} {}", p.name, p.policy, style::dim(&p.updated_at));
    }
    Ok(())
}

/// Forget the remembered answer for `name`.
pub fn run_clear(config: &SyncConfig, name: &str) -> Result<()> {
    let db = open_database(config)?;
    if db
        .clear_upload_preference(name)
        .context("failed to clear upload preference")?
    {
        println!("{}", style::success(&format!("'{}' will be asked about again", name)));
    } else {
        println!("{}", style::warn(&format!("no preference stored for '{}'", name)));
    }
    Ok(())
}
