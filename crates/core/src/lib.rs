//! scriptsync core library.
//!
//! This crate provides the components for conflict-aware script uploads:
//! configuration, database persistence, local script reading, the server
//! store seam, conflict detection and interactive conflict resolution, and
//! the upload orchestrator.

pub mod config;
pub mod conflict;
pub mod db;
pub mod errors;
pub mod local_source;
pub mod models;
pub mod preferences;
pub mod store;
pub mod upload;

// Re-exports for convenience.
pub use config::SyncConfig;
pub use conflict::{resolve_conflicts, Answer, Prompt, Resolution, ResolveOptions};
pub use db::Database;
pub use models::{ConflictFlags, ScriptDescriptor};
pub use upload::Uploader;
