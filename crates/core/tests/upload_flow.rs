//! End-to-end tests for conflict-aware uploads.
//!
//! These tests exercise the real `Uploader` with:
//! - A config file loaded from disk with relative paths
//! - A local scripts directory and a directory-backed server store
//! - A real SQLite database in the workspace data directory
//! - A scripted prompt standing in for the operator

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use scriptsync_core::conflict::{Answer, Prompt};
use scriptsync_core::errors::{PromptError, UploadError};
use scriptsync_core::store::{DirectoryStore, ManifestEntry, ScriptStore};
use scriptsync_core::upload::UploadKind;
use scriptsync_core::{SyncConfig, Uploader};

// ===========================================================================
// Helpers
// ===========================================================================

/// Replays canned answers and records the questions it was asked.
struct Operator {
    answers: VecDeque<Option<Answer>>,
    asked: Vec<(String, Vec<Answer>)>,
}

impl Operator {
    fn answering(answers: impl IntoIterator<Item = Option<Answer>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    fn silent() -> Self {
        Self {
            answers: VecDeque::new(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for Operator {
    fn ask(&mut self, question: &str, options: &[Answer]) -> Result<Option<Answer>, PromptError> {
        self.asked.push((question.to_string(), options.to_vec()));
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::Unavailable(format!("unexpected question: {question}")))
    }
}

struct Workspace {
    dir: TempDir,
    config: SyncConfig,
}

impl Workspace {
    fn new(options: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::create_dir_all(dir.path().join("server")).unwrap();

        let toml = format!(
            "[workspace]\nscripts_dir = \"scripts\"\ndata_dir = \"data\"\n\n\
             [server]\nroot = \"server\"\nprincipal = \"tester\"\n\n[options]\n{options}\n"
        );
        let config_path = dir.path().join("scriptsync.toml");
        std::fs::write(&config_path, toml).unwrap();
        let config = SyncConfig::load_and_resolve(&config_path).unwrap();

        Self { dir, config }
    }

    fn local(&self, name: &str) -> PathBuf {
        self.dir.path().join("scripts").join(format!("{name}.js"))
    }

    fn server(&self, name: &str) -> PathBuf {
        self.dir.path().join("server").join(format!("{name}.js"))
    }

    fn server_root(&self) -> &Path {
        &self.config.server.root
    }

    fn write_local(&self, name: &str, content: &str) {
        std::fs::write(self.local(name), content).unwrap();
    }

    fn write_server(&self, name: &str, content: &str) {
        std::fs::write(self.server(name), content).unwrap();
    }

    fn read_server(&self, name: &str) -> String {
        std::fs::read_to_string(self.server(name)).unwrap()
    }

    fn uploader(&self) -> Uploader<DirectoryStore> {
        Uploader::open(&self.config).unwrap()
    }

    /// Upload everything once so hashes are recorded.
    fn baseline(&self) {
        self.uploader().upload(&[], false, Operator::silent()).unwrap();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_first_upload_creates_database_and_server_copies() {
    let ws = Workspace::new("");
    ws.write_local("alpha", "a1");
    ws.write_local("beta", "b1");

    let report = ws.uploader().upload(&[], false, Operator::silent()).unwrap();

    assert_eq!(report.uploaded.len(), 2);
    assert!(report.uploaded.iter().all(|u| u.kind == UploadKind::New));
    assert_eq!(ws.read_server("alpha"), "a1");
    assert!(ws.config.workspace.database_path().exists());
}

#[test]
fn test_all_answer_forces_remaining_batch_with_one_question() {
    let ws = Workspace::new("");
    for name in ["a", "b", "c"] {
        ws.write_local(name, "v1");
    }
    ws.baseline();

    for name in ["a", "b", "c"] {
        ws.write_server(name, "changed on server");
        ws.write_local(name, "v2");
    }

    let mut operator = Operator::answering([Some(Answer::All)]);
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();

    assert_eq!(operator.asked.len(), 1);
    assert_eq!(
        operator.asked[0].1,
        [Answer::Yes, Answer::No, Answer::All, Answer::SkipAll]
    );
    assert_eq!(report.uploaded.len(), 3);
    assert!(report.uploaded.iter().all(|u| u.kind == UploadKind::Forced));
    for name in ["a", "b", "c"] {
        assert_eq!(ws.read_server(name), "v2");
    }
}

#[test]
fn test_none_answer_keeps_every_server_copy() {
    let ws = Workspace::new("");
    for name in ["a", "b"] {
        ws.write_local(name, "v1");
    }
    ws.baseline();
    for name in ["a", "b"] {
        ws.write_server(name, "server edit");
        ws.write_local(name, "v2");
    }

    let mut operator = Operator::answering([Some(Answer::SkipAll)]);
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();

    assert!(report.uploaded.is_empty());
    assert_eq!(report.skipped, ["a", "b"]);
    assert_eq!(ws.read_server("a"), "server edit");

    let audit = ws.uploader().db().list_audit_log(10).unwrap();
    assert_eq!(audit.iter().filter(|e| e.action == "script_skipped").count(), 2);
}

#[test]
fn test_clean_and_conflicting_scripts_in_one_batch() {
    let ws = Workspace::new("");
    ws.write_local("clean", "c1");
    ws.write_local("dirty", "d1");
    ws.baseline();

    ws.write_server("dirty", "server edit");
    ws.write_local("clean", "c2");
    ws.write_local("dirty", "d2");

    let mut operator = Operator::answering([Some(Answer::Yes)]);
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();

    assert_eq!(operator.asked.len(), 1);
    assert!(operator.asked[0].0.contains("'dirty' has been changed on the server"));
    let kinds: Vec<_> = report.uploaded.iter().map(|u| (u.name.as_str(), u.kind)).collect();
    assert_eq!(
        kinds,
        [("clean", UploadKind::Clean), ("dirty", UploadKind::Forced)]
    );
}

#[test]
fn test_category_conflict_ignored_when_disabled() {
    let ws = Workspace::new("categories = false");
    ws.write_local("inv", "// #category billing\nreturn 1;\n");
    ws.baseline();

    let store = DirectoryStore::open(ws.server_root(), "js").unwrap();
    store
        .set_entry(
            "inv",
            ManifestEntry {
                category: Some("hr".into()),
                ..ManifestEntry::default()
            },
        )
        .unwrap();

    let mut operator = Operator::silent();
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();

    assert!(operator.asked.is_empty());
    assert_eq!(report.uploaded[0].kind, UploadKind::Forced);
    let remote = store.fetch("inv").unwrap().unwrap();
    assert_eq!(remote.category.as_deref(), Some("billing"));
}

#[test]
fn test_category_conflict_asked_when_enabled() {
    let ws = Workspace::new("categories = true");
    ws.write_local("inv", "// #category billing\nreturn 1;\n");
    ws.baseline();

    let store = DirectoryStore::open(ws.server_root(), "js").unwrap();
    store
        .set_entry(
            "inv",
            ManifestEntry {
                category: Some("hr".into()),
                ..ManifestEntry::default()
            },
        )
        .unwrap();

    let mut operator = Operator::answering([Some(Answer::No)]);
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();

    assert_eq!(operator.asked.len(), 1);
    assert_eq!(operator.asked[0].1, [Answer::Yes, Answer::No]);
    assert_eq!(report.skipped, ["inv"]);
}

#[test]
fn test_unmarked_script_keeps_server_category() {
    let ws = Workspace::new("");
    ws.write_server("a", "return 1;\n");
    ws.write_local("a", "return 1;\n");
    let store = DirectoryStore::open(ws.server_root(), "js").unwrap();
    store
        .set_entry(
            "a",
            ManifestEntry {
                category: Some("hr".into()),
                ..ManifestEntry::default()
            },
        )
        .unwrap();

    let mut operator = Operator::silent();
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();

    assert!(operator.asked.is_empty());
    assert_eq!(report.uploaded[0].kind, UploadKind::Clean);
    let remote = store.fetch("a").unwrap().unwrap();
    assert_eq!(remote.category.as_deref(), Some("hr"));
}

#[test]
fn test_encrypted_server_copy_wording() {
    let ws = Workspace::new("");
    ws.write_server("secret", "@@cipher@@");
    ws.write_local("secret", "plain");
    let store = DirectoryStore::open(ws.server_root(), "js").unwrap();
    store
        .set_entry(
            "secret",
            ManifestEntry {
                encrypted: true,
                hash: Some("server-side-hash".into()),
                ..ManifestEntry::default()
            },
        )
        .unwrap();

    let mut operator = Operator::answering([Some(Answer::Yes)]);
    ws.uploader()
        .upload(&["secret".to_string()], false, &mut operator)
        .unwrap();

    assert!(operator.asked[0].0.contains("encrypted"));
    assert_eq!(ws.read_server("secret"), "plain");
}

#[test]
fn test_config_force_upload_all() {
    let ws = Workspace::new("force_upload_all = true");
    ws.write_server("a", "server");
    ws.write_local("a", "local");

    let mut operator = Operator::silent();
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();
    assert!(operator.asked.is_empty());
    assert_eq!(report.uploaded[0].kind, UploadKind::Forced);
}

#[test]
fn test_identical_unsynced_copy_is_clean() {
    let ws = Workspace::new("");
    ws.write_server("a", "same");
    ws.write_local("a", "same");

    let mut operator = Operator::silent();
    let report = ws.uploader().upload(&[], false, &mut operator).unwrap();
    assert!(operator.asked.is_empty());
    assert_eq!(report.uploaded[0].kind, UploadKind::Clean);
}

#[test]
fn test_broken_prompt_aborts_without_uploading() {
    let ws = Workspace::new("");
    ws.write_server("a", "server");
    ws.write_local("a", "local");

    let result = ws.uploader().upload(&[], false, Operator::silent());
    assert!(matches!(result, Err(UploadError::PromptError(_))));
    assert_eq!(ws.read_server("a"), "server");
}
