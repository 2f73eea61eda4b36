//! Server-side script storage.
//!
//! [`ScriptStore`] is the seam to whatever holds the server copies. The
//! bundled [`DirectoryStore`] keeps one file per script plus a JSON manifest
//! with per-script metadata, which is enough to run uploads against a shared
//! directory or a mounted server export.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::models::{is_valid_script_name, source_hash, RemoteScript, ScriptDescriptor};

/// Name of the metadata file inside a [`DirectoryStore`] root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Access to server copies of scripts.
pub trait ScriptStore {
    /// Fetch the server copy of `name`, or `None` if the server has none.
    fn fetch(&self, name: &str) -> Result<Option<RemoteScript>, StoreError>;

    /// Replace (or create) the server copy of `script`.
    fn upload(&self, script: &ScriptDescriptor) -> Result<RemoteScript, StoreError>;

    /// Names of all scripts on the server, sorted.
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Per-script metadata kept in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub encrypted: bool,
    /// Server-reported hash; only meaningful for encrypted scripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

type Manifest = BTreeMap<String, ManifestEntry>;

/// A [`ScriptStore`] backed by a plain directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    extension: String,
}

impl DirectoryStore {
    /// Open a store rooted at `root`. The directory must already exist.
    pub fn open<P: AsRef<Path>>(root: P, extension: &str) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::RootNotFound(root.display().to_string()));
        }
        info!(root = %root.display(), "opened directory script store");
        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    /// Set the manifest metadata of a script, e.g. to mark it encrypted.
    pub fn set_entry(&self, name: &str, entry: ManifestEntry) -> Result<(), StoreError> {
        validate_name(name)?;
        let mut manifest = self.read_manifest()?;
        manifest.insert(name.to_string(), entry);
        self.write_manifest(&manifest)
    }

    fn script_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, self.extension))
    }

    fn read_manifest(&self) -> Result<Manifest, StoreError> {
        let path = self.root.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(Manifest::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|e| StoreError::ManifestError(e.to_string()))
    }

    fn write_manifest(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| StoreError::ManifestError(e.to_string()))?;
        std::fs::write(self.root.join(MANIFEST_FILE), json)?;
        Ok(())
    }
}

impl ScriptStore for DirectoryStore {
    fn fetch(&self, name: &str) -> Result<Option<RemoteScript>, StoreError> {
        validate_name(name)?;
        let path = self.script_path(name);
        if !path.exists() {
            debug!(script = name, "no server copy");
            return Ok(None);
        }

        let source_code = std::fs::read_to_string(&path)?;
        let entry = self.read_manifest()?.remove(name).unwrap_or_default();
        let hash = match (&entry.hash, entry.encrypted) {
            (Some(hash), true) => hash.clone(),
            _ => source_hash(&source_code),
        };

        Ok(Some(RemoteScript {
            name: name.to_string(),
            source_code,
            category: entry.category,
            encrypted: entry.encrypted,
            hash,
        }))
    }

    fn upload(&self, script: &ScriptDescriptor) -> Result<RemoteScript, StoreError> {
        validate_name(&script.name)?;
        std::fs::write(self.script_path(&script.name), &script.source_code)?;

        // A fresh upload replaces any encrypted copy with plain source.
        // Scripts without a category marker keep the server's category.
        let mut manifest = self.read_manifest()?;
        let previous = manifest.remove(&script.name).unwrap_or_default();
        let category = script.category.clone().or(previous.category);
        let entry = ManifestEntry {
            category: category.clone(),
            encrypted: false,
            hash: None,
        };
        manifest.insert(script.name.clone(), entry);
        self.write_manifest(&manifest)?;

        info!(script = %script.name, forced = script.force_upload, "uploaded script");
        Ok(RemoteScript {
            name: script.name.clone(),
            source_code: script.source_code.clone(),
            category,
            encrypted: false,
            hash: source_hash(&script.source_code),
        })
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let suffix = format!(".{}", self.extension);
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(&suffix)) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if !is_valid_script_name(name) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, DirectoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path(), "js").unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_missing_root() {
        let result = DirectoryStore::open("/nonexistent/scriptsync-store", "js");
        assert!(matches!(result, Err(StoreError::RootNotFound(_))));
    }

    #[test]
    fn test_fetch_missing_script() {
        let (_dir, store) = store();
        assert!(store.fetch("invoice").unwrap().is_none());
    }

    #[test]
    fn test_upload_then_fetch() {
        let (_dir, store) = store();
        let mut script = ScriptDescriptor::new("invoice", "return 1;");
        script.category = Some("billing".into());

        let uploaded = store.upload(&script).unwrap();
        assert_eq!(uploaded.hash, source_hash("return 1;"));

        let fetched = store.fetch("invoice").unwrap().unwrap();
        assert_eq!(fetched.source_code, "return 1;");
        assert_eq!(fetched.category.as_deref(), Some("billing"));
        assert!(!fetched.encrypted);
        assert_eq!(fetched.hash, uploaded.hash);
        assert_eq!(store.list().unwrap(), ["invoice"]);
    }

    #[test]
    fn test_encrypted_entry_reports_manifest_hash() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("secret.js"), "@@ciphertext@@").unwrap();
        store
            .set_entry(
                "secret",
                ManifestEntry {
                    category: None,
                    encrypted: true,
                    hash: Some("abc".into()),
                },
            )
            .unwrap();

        let fetched = store.fetch("secret").unwrap().unwrap();
        assert!(fetched.encrypted);
        assert_eq!(fetched.hash, "abc");

        store.upload(&ScriptDescriptor::new("secret", "plain")).unwrap();
        let fetched = store.fetch("secret").unwrap().unwrap();
        assert!(!fetched.encrypted);
    }

    #[test]
    fn test_unmarked_upload_keeps_server_category() {
        let (_dir, store) = store();
        let mut script = ScriptDescriptor::new("invoice", "v1");
        script.category = Some("billing".into());
        store.upload(&script).unwrap();

        let uploaded = store.upload(&ScriptDescriptor::new("invoice", "v2")).unwrap();
        assert_eq!(uploaded.category.as_deref(), Some("billing"));
        let fetched = store.fetch("invoice").unwrap().unwrap();
        assert_eq!(fetched.source_code, "v2");
        assert_eq!(fetched.category.as_deref(), Some("billing"));

        let mut script = ScriptDescriptor::new("invoice", "v3");
        script.category = Some("archive".into());
        store.upload(&script).unwrap();
        let fetched = store.fetch("invoice").unwrap().unwrap();
        assert_eq!(fetched.category.as_deref(), Some("archive"));
    }

    #[test]
    fn test_list_ignores_other_files() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("b.js"), "").unwrap();
        std::fs::write(dir.path().join("a.js"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        store.upload(&ScriptDescriptor::new("c", "")).unwrap();
        assert_eq!(store.list().unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("ok_name").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../escape").is_err());
        assert!(validate_name("a\\b").is_err());
        assert!(validate_name(".hidden").is_err());
    }
}
