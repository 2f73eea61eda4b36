//! Upload orchestration.
//!
//! The [`Uploader`] drives one upload run:
//!
//! 1. Read the requested local scripts.
//! 2. Attach the last sync hash recorded in the database.
//! 3. Detect conflicts against the server copy.
//! 4. Resolve conflicts with the operator (new scripts skip this step).
//! 5. Upload, record the new hash, and write the audit log.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{OptionsConfig, SyncConfig};
use crate::conflict::{resolve_conflicts, ConflictDetector, Prompt, Resolution};
use crate::db::{Database, UploadPolicy};
use crate::errors::UploadError;
use crate::local_source::LocalSource;
use crate::models::{ConflictFlags, ScriptDescriptor};
use crate::preferences::ensure_upload_on_save;
use crate::store::{DirectoryStore, ScriptStore};

/// Why a script was uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    /// The server had no copy.
    New,
    /// The server copy was unchanged since the last sync.
    Clean,
    /// The operator approved overwriting a conflicting server copy.
    Forced,
}

/// One uploaded script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedScript {
    pub name: String,
    pub hash: String,
    pub kind: UploadKind,
}

/// Outcome of an upload run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<UploadedScript>,
    /// Scripts the operator (or a batch answer) declined to upload.
    pub skipped: Vec<String>,
}

/// Sync state of a script, as shown by `status`.
///
/// Covers local scripts as well as scripts that only exist on the server or
/// only in the sync database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStatus {
    pub name: String,
    pub last_sync_hash: Option<String>,
    pub local: bool,
    pub on_server: bool,
    pub conflict: ConflictFlags,
    pub preference: Option<UploadPolicy>,
}

/// Orchestrates uploads from a [`LocalSource`] to a [`ScriptStore`].
pub struct Uploader<S: ScriptStore> {
    options: OptionsConfig,
    principal: String,
    db: Database,
    store: S,
    source: LocalSource,
}

impl Uploader<DirectoryStore> {
    /// Open the database, store and local source described by `config`.
    pub fn open(config: &SyncConfig) -> Result<Self, UploadError> {
        let db = Database::open_initialized(config.workspace.database_path())?;
        let store = DirectoryStore::open(&config.server.root, &config.workspace.extension)?;
        let source = LocalSource::new(&config.workspace.scripts_dir, &config.workspace.extension);
        Ok(Self::new(config, db, store, source))
    }
}

impl<S: ScriptStore> Uploader<S> {
    pub fn new(config: &SyncConfig, db: Database, store: S, source: LocalSource) -> Self {
        info!(
            scripts_dir = %source.dir().display(),
            principal = %config.server.principal,
            "initializing uploader"
        );
        Self {
            options: config.options.clone(),
            principal: config.server.principal.clone(),
            db,
            store,
            source,
        }
    }

    /// Return a reference to the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Upload `names` (every local script when empty).
    ///
    /// `force_all` approves every conflicting script without asking, in
    /// addition to the configured `force_upload_all`.
    pub fn upload<P: Prompt>(
        &self,
        names: &[String],
        force_all: bool,
        prompt: P,
    ) -> Result<UploadReport, UploadError> {
        let scripts = self.read_scripts(names)?;
        info!(count = scripts.len(), "starting upload");

        let mut new_scripts = Vec::new();
        let mut existing = Vec::new();
        for mut script in scripts {
            script.last_sync_hash = self.db.get_sync_hash(&script.name)?;
            let remote = self.store.fetch(&script.name)?;
            ConflictDetector::detect(&mut script, remote.as_ref());
            if remote.is_some() {
                existing.push(script);
            } else {
                new_scripts.push(script);
            }
        }

        let Resolution {
            clean,
            approved,
            rejected,
        } = resolve_conflicts(existing, &self.options.resolve_options(force_all), prompt)?;

        let mut report = UploadReport::default();
        for name in rejected {
            self.audit("script_skipped", &name, "upload declined after conflict", false);
            report.skipped.push(name);
        }

        let pending: Vec<(UploadKind, ScriptDescriptor)> = new_scripts
            .into_iter()
            .map(|s| (UploadKind::New, s))
            .chain(clean.into_iter().map(|s| (UploadKind::Clean, s)))
            .chain(approved.into_iter().map(|s| (UploadKind::Forced, s)))
            .collect();
        for (index, (kind, script)) in pending.iter().enumerate() {
            match self.upload_one(script, *kind) {
                Ok(uploaded) => report.uploaded.push(uploaded),
                Err(e) => {
                    let remaining: Vec<&str> =
                        pending[index + 1..].iter().map(|(_, s)| s.name.as_str()).collect();
                    warn!(
                        script = %script.name,
                        uploaded = report.uploaded.len(),
                        ?remaining,
                        error = %e,
                        "upload aborted"
                    );
                    self.audit("script_upload_failed", &script.name, &e.to_string(), false);
                    return Err(e);
                }
            }
        }

        info!(
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            "upload complete"
        );
        Ok(report)
    }

    /// Handle a local save of `name`: ask (or recall) whether to upload it,
    /// then run a normal upload for that one script.
    ///
    /// Returns `None` when the operator chose not to upload.
    pub fn upload_on_save<P: Prompt>(
        &self,
        name: &str,
        mut prompt: P,
    ) -> Result<Option<UploadReport>, UploadError> {
        // Fail before asking if the script does not exist.
        self.source.read_script(name)?;

        if !ensure_upload_on_save(name, &self.db, &mut prompt)? {
            debug!(script = name, "not uploading on save");
            return Ok(None);
        }
        self.upload(&[name.to_string()], false, &mut prompt).map(Some)
    }

    /// Conflict state of every known script, without prompting or uploading.
    ///
    /// Local scripts are checked against the server. Scripts that are only on
    /// the server, or only tracked in the database, are listed without a
    /// conflict. The result is sorted by name.
    pub fn status(&self) -> Result<Vec<ScriptStatus>, UploadError> {
        let mut statuses = BTreeMap::new();
        for mut script in self.source.read_all()? {
            script.last_sync_hash = self.db.get_sync_hash(&script.name)?;
            let remote = self.store.fetch(&script.name)?;
            ConflictDetector::detect(&mut script, remote.as_ref());
            let status = ScriptStatus {
                preference: self.db.get_upload_preference(&script.name)?,
                name: script.name.clone(),
                last_sync_hash: script.last_sync_hash,
                local: true,
                on_server: remote.is_some(),
                conflict: script.conflict,
            };
            statuses.insert(script.name, status);
        }

        for name in self.store.list()? {
            if !statuses.contains_key(&name) {
                let status = self.remote_only_status(&name, true)?;
                statuses.insert(name, status);
            }
        }

        for entry in self.db.list_sync_hashes()? {
            if !statuses.contains_key(&entry.name) {
                debug!(
                    script = %entry.name,
                    synced_at = %entry.synced_at,
                    "tracked script is gone"
                );
                let status = self.remote_only_status(&entry.name, false)?;
                statuses.insert(entry.name, status);
            }
        }

        Ok(statuses.into_values().collect())
    }

    fn remote_only_status(
        &self,
        name: &str,
        on_server: bool,
    ) -> Result<ScriptStatus, UploadError> {
        Ok(ScriptStatus {
            name: name.to_string(),
            last_sync_hash: self.db.get_sync_hash(name)?,
            local: false,
            on_server,
            conflict: ConflictFlags::NONE,
            preference: self.db.get_upload_preference(name)?,
        })
    }

    fn read_scripts(&self, names: &[String]) -> Result<Vec<ScriptDescriptor>, UploadError> {
        if names.is_empty() {
            return Ok(self.source.read_all()?);
        }
        let scripts = names
            .iter()
            .map(|name| self.source.read_script(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scripts)
    }

    fn upload_one(
        &self,
        script: &ScriptDescriptor,
        kind: UploadKind,
    ) -> Result<UploadedScript, UploadError> {
        let remote = self.store.upload(script)?;
        self.db.record_sync_hash(&script.name, &remote.hash)?;

        let details = format!("uploaded ({kind:?}) by '{}'", self.principal);
        self.audit("script_uploaded", &script.name, &details, true);

        Ok(UploadedScript {
            name: script.name.clone(),
            hash: remote.hash,
            kind,
        })
    }

    fn audit(&self, action: &str, script: &str, details: &str, success: bool) {
        if let Err(e) = self
            .db
            .insert_audit_log(action, Some(script), Some(details), success)
        {
            warn!(script, action, error = %e, "failed to write audit log entry");
        }
    }
}
