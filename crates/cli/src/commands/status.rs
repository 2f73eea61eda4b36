//! `status` subcommand: sync state of every known script.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use scriptsync_core::{SyncConfig, Uploader};

use super::style;

/// Show one row per local, server-side, or tracked script.
pub fn run_status(config: &SyncConfig) -> Result<()> {
    let uploader = Uploader::open(config).context("failed to open workspace")?;
    let statuses = uploader.status().context("failed to compute status")?;

    if statuses.is_empty() {
        println!();
        println!(
            "{}",
            style::dim(&format!(
                "No scripts found in {}",
                config.workspace.scripts_dir.display()
            ))
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", style::header(&format!("Scripts ({})", statuses.len())));
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Script", "Local", "Server", "Last sync", "Conflict", "On save"]);

    for s in &statuses {
        let local = if s.local { "present" } else { "missing" };
        let server = match (s.on_server, s.local) {
            (true, _) => "present",
            (false, true) => "new",
            (false, false) => "deleted",
        };
        let hash = s
            .last_sync_hash
            .as_deref()
            .map(style::short_hash)
            .unwrap_or("-");
        let preference = s
            .preference
            .map(|p| p.to_string())
            .unwrap_or_else(|| "ask".to_string());

        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(local),
            Cell::new(server),
            Cell::new(hash),
            Cell::new(s.conflict.to_string()),
            Cell::new(preference),
        ]);
    }

    println!("{}", table);

    let conflicts = statuses.iter().filter(|s| !s.conflict.is_empty()).count();
    if conflicts > 0 {
        println!(
            "{}",
            style::warn(&format!("{} script(s) conflict with the server copy", conflicts))
        );
    } else {
        println!("{}", style::success("No conflicts"));
    }
    println!();

    Ok(())
}
