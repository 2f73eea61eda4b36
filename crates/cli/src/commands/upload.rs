//! `upload` and `save` subcommands.

use anyhow::{Context, Result};

use scriptsync_core::upload::{UploadKind, UploadReport};
use scriptsync_core::{SyncConfig, Uploader};

use super::prompt;
use super::style;

/// Upload `names` (all local scripts when empty).
pub fn run_upload(config: &SyncConfig, names: &[String], force_all: bool) -> Result<()> {
    let uploader = Uploader::open(config).context("failed to open workspace")?;

    let report = uploader
        .upload(names, force_all, prompt::terminal_or_none())
        .context("upload failed")?;

    print_report(&report);
    Ok(())
}

/// Ask whether to upload a just-saved script, then upload it.
pub fn run_save(config: &SyncConfig, name: &str) -> Result<()> {
    let uploader = Uploader::open(config).context("failed to open workspace")?;

    match uploader
        .upload_on_save(name, prompt::terminal_or_none())
        .context("upload failed")?
    {
        Some(report) => print_report(&report),
        None => println!("{}", style::dim(&format!("'{}' not uploaded", name))),
    }
    Ok(())
}

fn print_report(report: &UploadReport) {
    println!();
    if report.uploaded.is_empty() && report.skipped.is_empty() {
        println!("{}", style::dim("Nothing to upload"));
        println!();
        return;
    }

    for script in &report.uploaded {
        let suffix = match script.kind {
            UploadKind::New => style::dim("(new)"),
            UploadKind::Clean => String::new(),
            UploadKind::Forced => format!("({})", style::forced()),
        };
        let line = format!("{} {}", script.name, style::dim(style::short_hash(&script.hash)));
        println!("{} {}", style::success(&line), suffix);
    }

    for name in &report.skipped {
        println!("{}", style::warn(&format!("{} skipped (server copy kept)", name)));
    }

    println!();
    println!(
        "{} uploaded, {} skipped",
        report.uploaded.len(),
        report.skipped.len()
    );
}
