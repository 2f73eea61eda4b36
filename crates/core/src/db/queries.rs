//! Typed query helpers for every table in the scriptsync database.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Database;
use crate::errors::DatabaseError;

// ---------------------------------------------------------------------------
// Domain structs returned by queries
// ---------------------------------------------------------------------------

/// A row from the `sync_hashes` table.
#[derive(Debug, Clone)]
pub struct SyncHashEntry {
    pub name: String,
    pub hash: String,
    pub synced_at: String,
}

/// A remembered answer to the upload-on-save question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPolicy {
    Always,
    Never,
}

impl UploadPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for UploadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadPolicy {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(DatabaseError::InvalidValue {
                entity: "upload policy".into(),
                value: other.to_string(),
            }),
        }
    }
}

/// A row from the `upload_preferences` table.
#[derive(Debug, Clone)]
pub struct UploadPreferenceEntry {
    pub name: String,
    pub policy: UploadPolicy,
    pub updated_at: String,
}

/// A row from the `audit_log` table.
#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub id: i64,
    pub action: String,
    pub script: Option<String>,
    pub details: Option<String>,
    pub success: bool,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Query implementations
// ---------------------------------------------------------------------------

impl Database {
    // -- sync_hashes --------------------------------------------------------

    /// Upsert the hash of the server copy as of the latest sync.
    pub fn record_sync_hash(&self, name: &str, hash: &str) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sync_hashes (name, hash, synced_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET hash = excluded.hash, synced_at = excluded.synced_at",
            params![name, hash, now],
        )?;
        debug!(script = name, hash, "recorded sync hash");
        Ok(())
    }

    /// Look up the last sync hash of a script.
    pub fn get_sync_hash(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn();
        let hash = conn
            .query_row(
                "SELECT hash FROM sync_hashes WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// List all tracked scripts, sorted by name.
    pub fn list_sync_hashes(&self) -> Result<Vec<SyncHashEntry>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT name, hash, synced_at FROM sync_hashes ORDER BY name")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(SyncHashEntry {
                    name: row.get(0)?,
                    hash: row.get(1)?,
                    synced_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // -- upload_preferences -------------------------------------------------

    /// Remember an upload-on-save policy for a script.
    pub fn set_upload_preference(
        &self,
        name: &str,
        policy: UploadPolicy,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO upload_preferences (name, policy, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET policy = excluded.policy,
                 updated_at = excluded.updated_at",
            params![name, policy.as_str(), now],
        )?;
        debug!(script = name, %policy, "set upload preference");
        Ok(())
    }

    pub fn get_upload_preference(
        &self,
        name: &str,
    ) -> Result<Option<UploadPolicy>, DatabaseError> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT policy FROM upload_preferences WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| s.parse::<UploadPolicy>()).transpose()
    }

    /// Forget a remembered policy. Returns whether one existed.
    pub fn clear_upload_preference(&self, name: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn();
        let removed = conn.execute(
            "DELETE FROM upload_preferences WHERE name = ?1",
            params![name],
        )?;
        debug!(script = name, removed, "cleared upload preference");
        Ok(removed > 0)
    }

    pub fn list_upload_preferences(&self) -> Result<Vec<UploadPreferenceEntry>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT name, policy, updated_at FROM upload_preferences ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, policy, updated_at)| -> Result<_, DatabaseError> {
                Ok(UploadPreferenceEntry {
                    name,
                    policy: policy.parse()?,
                    updated_at,
                })
            })
            .collect()
    }

    // -- audit_log ----------------------------------------------------------

    /// Insert an audit-log entry.
    pub fn insert_audit_log(
        &self,
        action: &str,
        script: Option<&str>,
        details: Option<&str>,
        success: bool,
    ) -> Result<i64, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO audit_log (action, script, details, success, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![action, script, details, success, now],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, action, "inserted audit_log entry");
        Ok(id)
    }

    /// List recent audit-log entries, newest first.
    pub fn list_audit_log(&self, limit: u32) -> Result<Vec<AuditLogEntry>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, action, script, details, success, created_at
             FROM audit_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(AuditLogEntry {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    script: row.get(2)?,
                    details: row.get(3)?,
                    success: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
