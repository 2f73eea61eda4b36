//! scriptsync command-line tool.
//!
//! Uploads local scripts to the configured script server, asking before a
//! server copy that changed since the last sync is overwritten. Also
//! provides subcommands for generating and validating the configuration,
//! inspecting script state, the audit log, and remembered answers.

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scriptsync_core::errors::ConfigError;
use scriptsync_core::{Database, SyncConfig};

use commands::style;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// scriptsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "scriptsync",
    version,
    about = "Upload scripts to a script server without clobbering server-side changes"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./scriptsync.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./scriptsync.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,

    /// Upload scripts, asking before overwriting changed server copies.
    Upload {
        /// Script names to upload. Uploads every local script when omitted.
        names: Vec<String>,

        /// Overwrite every conflicting server copy without asking.
        #[arg(long)]
        all: bool,
    },

    /// Ask whether to upload a script that was just saved.
    Save {
        /// Script name.
        name: String,
    },

    /// Show the sync state of every local script.
    Status,

    /// Show recent audit log entries.
    Audit {
        /// Maximum number of entries to show.
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Manage remembered upload-on-save answers.
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// List remembered answers.
    List,
    /// Forget the remembered answer for a script.
    Clear {
        /// Script name.
        name: String,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Loaded before logging is set up so the file can pick the level.
    let config = SyncConfig::load_and_resolve(&cli.config);

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.workspace.log_level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: Result<SyncConfig, ConfigError>) -> Result<()> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&cli.config, config),
        command => {
            let config = config.context("failed to load configuration file")?;
            match command {
                Commands::Upload { names, all } => {
                    commands::upload::run_upload(&config, &names, all)
                }
                Commands::Save { name } => commands::upload::run_save(&config, &name),
                Commands::Status => commands::status::run_status(&config),
                Commands::Audit { limit } => cmd_audit(&config, limit),
                Commands::Prefs { action } => match action {
                    PrefsAction::List => commands::prefs::run_list(&config),
                    PrefsAction::Clear { name } => commands::prefs::run_clear(&config, &name),
                },
                Commands::Init { .. } | Commands::Validate => unreachable!(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, SyncConfig::default_template())
        .context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("Next steps:");
    println!("  1. Point [workspace].scripts_dir at your local scripts");
    println!("  2. Point [server].root at the server script directory");
    println!(
        "  3. Validate with: scriptsync validate --config {}",
        output.display()
    );
    println!(
        "  4. Upload with:   scriptsync upload --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(path: &Path, config: Result<SyncConfig, ConfigError>) -> Result<()> {
    println!("Validating configuration: {}", path.display());
    println!();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            println!("  [FAIL] {}", e);
            anyhow::bail!("configuration validation failed");
        }
    };
    println!("  [OK] TOML structure is valid");
    println!("  [OK] All required fields are valid");

    let check_dir = |label: &str, dir: &Path| {
        if dir.is_dir() {
            println!("  [OK] {} exists", label);
        } else {
            println!("  [WARN] {} does not exist: {}", label, dir.display());
        }
    };
    check_dir("Scripts directory", &config.workspace.scripts_dir);
    check_dir("Server root", &config.server.root);

    println!();
    println!("Configuration summary:");
    println!("  Scripts dir    : {}", config.workspace.scripts_dir.display());
    println!("  Extension      : .{}", config.workspace.extension);
    println!("  Server root    : {}", config.server.root.display());
    println!("  Principal      : {}", config.server.principal);
    println!("  Data directory : {}", config.workspace.data_dir.display());
    println!("  Category checks: {}", config.options.categories);
    println!("  Force upload   : {}", config.options.force_upload_all);
    println!("  Unverified     : {:?}", config.options.unverified);
    println!();
    println!("Configuration is valid.");

    Ok(())
}

fn cmd_audit(config: &SyncConfig, limit: u32) -> Result<()> {
    let db = Database::open_initialized(config.workspace.database_path())
        .context("failed to open database")?;
    let entries = db
        .list_audit_log(limit)
        .context("failed to list audit entries")?;

    if entries.is_empty() {
        println!("No audit log entries found.");
        return Ok(());
    }

    println!("{:<26} {:<16} {:<24} DETAILS", "TIMESTAMP", "ACTION", "SCRIPT");
    println!("{}", "-".repeat(100));

    for entry in &entries {
        let action = if entry.success {
            entry.action.clone()
        } else {
            format!("{} (!)", entry.action)
        };
        println!(
            "{:<26} {:<16} {:<24} {}",
            truncate(&entry.created_at, 25),
            action,
            truncate(entry.script.as_deref().unwrap_or("-"), 23),
            truncate(entry.details.as_deref().unwrap_or(""), 40),
        );
    }

    println!();
    println!("{} entries shown", entries.len());

    Ok(())
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
