//! Configuration for scriptsync.
//!
//! Configuration is read from a TOML file. Relative paths in the file are
//! resolved against the directory containing it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::{ResolveOptions, UnverifiedPolicy};
use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Local workspace settings.
    #[serde(default)]
    pub workspace: WorkspaceSection,

    /// Where the server copies live.
    pub server: ServerConfig,

    /// Upload behaviour options.
    #[serde(default)]
    pub options: OptionsConfig,
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// Local workspace settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSection {
    /// Directory holding the local scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// File extension of script files, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Directory for persistent data (the sync database).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_extension() -> String {
    "js".into()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".scriptsync")
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            extension: default_extension(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl WorkspaceSection {
    /// Path of the SQLite database inside `data_dir`.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("scriptsync.db")
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Server store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root directory of the server script store.
    pub root: PathBuf,

    /// Name recorded in the audit log for uploads.
    #[serde(default = "default_principal")]
    pub principal: String,
}

fn default_principal() -> String {
    "scriptsync".into()
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Upload behaviour options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Ask before overwriting a server copy with a different category.
    #[serde(default = "default_true")]
    pub categories: bool,

    /// Overwrite conflicting server copies without asking.
    #[serde(default)]
    pub force_upload_all: bool,

    /// Handling of scripts whose server copy was never synced.
    #[serde(default)]
    pub unverified: UnverifiedPolicy,
}

fn default_true() -> bool {
    true
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            categories: true,
            force_upload_all: false,
            unverified: UnverifiedPolicy::default(),
        }
    }
}

impl OptionsConfig {
    /// Resolver options for one run; `force_all` from the command line
    /// is OR-ed with the configured default.
    pub fn resolve_options(&self, force_all: bool) -> ResolveOptions {
        ResolveOptions {
            force_all: force_all || self.force_upload_all,
            check_categories: self.categories,
            unverified: self.unverified,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Load a [`SyncConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.workspace.scripts_dir,
            &mut self.workspace.data_dir,
            &mut self.server.root,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        debug!(base = %base.display(), "resolved relative config paths");
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "workspace.extension".into(),
                detail: "script file extension must not be empty".into(),
            });
        }
        if self.server.root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.root".into(),
                detail: "server root must not be empty".into(),
            });
        }
        if self.server.principal.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.principal".into(),
                detail: "principal must not be empty".into(),
            });
        }
        if !matches!(
            self.workspace.log_level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::InvalidValue {
                field: "workspace.log_level".into(),
                detail: format!("unknown level '{}'", self.workspace.log_level),
            });
        }
        Ok(())
    }

    /// Convenience: load, resolve paths, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::load_from_file(path)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# scriptsync configuration
# Relative paths are resolved against the directory of this file.

[workspace]
scripts_dir = "scripts"
extension = "js"
data_dir = ".scriptsync"
log_level = "warn"

[server]
root = "server"
principal = "scriptsync"

[options]
# Ask before overwriting a server script whose category differs.
categories = true
# Overwrite conflicting server scripts without asking.
force_upload_all = false
# Scripts never synced before: "ask" or "skip".
unverified = "ask"
"#
    }
}
