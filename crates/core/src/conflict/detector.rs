//! Conflict detection logic.
//!
//! Given a local script and the current server copy, the detector sets the
//! script's conflict bitmask. A source conflict means the server copy moved
//! away from what was last synced; a category conflict means the two sides
//! disagree on the script's category.

use tracing::{debug, info};

use crate::models::{source_hash, ConflictFlags, RemoteScript, ScriptDescriptor};

/// Stateless conflict detection.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Recompute `script.conflict` against `remote`.
    ///
    /// A script with no server copy has nothing to overwrite and never
    /// conflicts. When both sides hold identical code the remote hash is
    /// adopted, whether the recorded hash is missing or stale, so the script
    /// counts as verified clean.
    pub fn detect(script: &mut ScriptDescriptor, remote: Option<&RemoteScript>) {
        script.conflict = ConflictFlags::NONE;

        let Some(remote) = remote else {
            debug!(script = %script.name, "no server copy; nothing to conflict with");
            return;
        };

        script.encrypted = remote.encrypted;

        if remote.encrypted {
            // Ciphertext cannot be re-hashed locally, only the server hash is usable.
            if script.last_sync_hash.as_deref() != Some(remote.hash.as_str()) {
                script.conflict.insert(ConflictFlags::SOURCE_CODE);
            }
        } else {
            let remote_hash = source_hash(&remote.source_code);
            if script.last_sync_hash.as_deref() != Some(remote_hash.as_str()) {
                if source_hash(&script.source_code) == remote_hash {
                    debug!(script = %script.name, "server copy matches local code; adopting hash");
                    script.last_sync_hash = Some(remote_hash);
                } else {
                    script.conflict.insert(ConflictFlags::SOURCE_CODE);
                }
            }
        }

        if let Some(local_category) = script.category.as_deref() {
            if remote.category.as_deref() != Some(local_category) {
                script.conflict.insert(ConflictFlags::CATEGORY);
            }
        }

        if !script.conflict.is_empty() {
            info!(
                script = %script.name,
                conflict = %script.conflict,
                encrypted = script.encrypted,
                "conflict detected"
            );
        }
    }
}
