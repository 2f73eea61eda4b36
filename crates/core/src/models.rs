//! Domain model types used throughout scriptsync.
//!
//! These types bridge the local source reader, the conflict subsystem, the
//! script store and the database layer.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Conflict bitmask
// ---------------------------------------------------------------------------

/// Bitmask of independent mismatches between a local script and its server
/// copy. `0` means no known conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictFlags(u32);

impl ConflictFlags {
    /// No conflict.
    pub const NONE: Self = Self(0);
    /// The server source code diverged from the last synced version.
    pub const SOURCE_CODE: Self = Self(0x1);
    /// The server category differs from the local category.
    pub const CATEGORY: Self = Self(0x2);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for ConflictFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConflictFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ConflictFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut parts = Vec::new();
        if self.contains(Self::SOURCE_CODE) {
            parts.push("source_code");
        }
        if self.contains(Self::CATEGORY) {
            parts.push("category");
        }
        write!(f, "{}", parts.join("|"))
    }
}

// ---------------------------------------------------------------------------
// Script descriptor
// ---------------------------------------------------------------------------

/// A local script queued for upload, together with what is known about its
/// server copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    /// Script identifier, also used in operator prompts.
    pub name: String,
    /// Local source text.
    pub source_code: String,
    /// Local category, if the script declares one.
    pub category: Option<String>,
    /// Known mismatches against the server copy.
    pub conflict: ConflictFlags,
    /// Hash of the server copy at the last successful sync.
    pub last_sync_hash: Option<String>,
    /// The server copy is encrypted and cannot be compared.
    pub encrypted: bool,
    /// Overwrite the server copy despite a conflict.
    pub force_upload: bool,
}

impl ScriptDescriptor {
    pub fn new(name: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_code: source_code.into(),
            category: None,
            conflict: ConflictFlags::NONE,
            last_sync_hash: None,
            encrypted: false,
            force_upload: false,
        }
    }

    /// A script is provably conflict-free only when no conflict is flagged
    /// *and* a previous hash of the server copy is known.
    pub fn is_verified_clean(&self) -> bool {
        self.conflict.is_empty() && self.last_sync_hash.is_some()
    }

    /// Mark the script as approved for overwriting the server copy.
    pub fn approve_force_upload(&mut self) {
        self.force_upload = true;
        self.conflict = ConflictFlags::NONE;
    }
}

// ---------------------------------------------------------------------------
// Remote script
// ---------------------------------------------------------------------------

/// The server-side copy of a script as reported by a
/// [`crate::store::ScriptStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScript {
    pub name: String,
    /// Source text; opaque ciphertext when `encrypted`.
    pub source_code: String,
    pub category: Option<String>,
    pub encrypted: bool,
    /// Content hash as reported by the server.
    pub hash: String,
}

/// Script names become file names on both sides, so path separators and
/// dot-prefixes are rejected.
pub fn is_valid_script_name(name: &str) -> bool {
    !(name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']))
}

/// Hash a script's source text.
///
/// Line endings are normalized to `\n` first so that a checkout on Windows
/// hashes the same as the server copy.
pub fn source_hash(source: &str) -> String {
    let normalized = source.replace("\r\n", "\n");
    let digest = Sha256::digest(normalized.as_bytes());
    hex::encode(digest)
}
