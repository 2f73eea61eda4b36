//! Upload conflict resolution.
//!
//! [`resolve_conflicts`] walks a batch of scripts in order and partitions it
//! into scripts that are provably clean, scripts the operator approved for a
//! forced upload, and rejected scripts. Answering "All" or "None" switches
//! the rest of the batch into a mode where no more questions are asked.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompt::{ask_checked, Answer, Prompt, YES_NO, YES_NO_ALL_NONE};
use crate::errors::PromptError;
use crate::models::{ConflictFlags, ScriptDescriptor};

/// What to do with a script that has no conflict flag but also no known
/// hash of its server copy, so it cannot be proven clean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnverifiedPolicy {
    /// Ask as if the server copy might have been changed.
    #[default]
    Ask,
    /// Leave the script out of both output lists.
    Skip,
}

/// Knobs for a single resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Approve every conflicting script without asking.
    pub force_all: bool,
    /// Ask about category mismatches. When off, they are ignored.
    pub check_categories: bool,
    pub unverified: UnverifiedPolicy,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            force_all: false,
            check_categories: true,
            unverified: UnverifiedPolicy::Ask,
        }
    }
}

/// The partitioned batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Scripts with a known hash and no conflict, in input order.
    pub clean: Vec<ScriptDescriptor>,
    /// Scripts approved for overwriting the server copy, in input order.
    /// Every entry has `force_upload == true` and an empty conflict mask.
    pub approved: Vec<ScriptDescriptor>,
    /// Names of scripts that must not be uploaded.
    pub rejected: Vec<String>,
}

impl Resolution {
    /// Scripts to hand to the uploader: clean first, then approved.
    pub fn into_uploads(self) -> Vec<ScriptDescriptor> {
        let mut all = self.clean;
        all.extend(self.approved);
        all
    }
}

/// Batch-wide state carried from one script to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchMode {
    Normal,
    ForceAll,
    ForceNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Clean,
    Approve,
    Reject,
}

/// Resolve upload conflicts for `scripts`, asking `prompt` one question at a
/// time.
///
/// Processing is strictly sequential: a later question may be skipped
/// because of an earlier "All"/"None" answer. A failing prompt aborts the
/// whole run with the prompt's error.
pub fn resolve_conflicts<P: Prompt>(
    scripts: Vec<ScriptDescriptor>,
    options: &ResolveOptions,
    mut prompt: P,
) -> Result<Resolution, PromptError> {
    let batch_size = scripts.len();
    let mut mode = if options.force_all {
        BatchMode::ForceAll
    } else {
        BatchMode::Normal
    };
    let mut resolution = Resolution::default();

    info!(batch_size, force_all = options.force_all, "resolving upload conflicts");

    for mut script in scripts {
        let decision = decide(&script, batch_size, options, &mut mode, &mut prompt)?;
        debug!(script = %script.name, conflict = %script.conflict, ?decision, "script resolved");

        match decision {
            Decision::Clean => resolution.clean.push(script),
            Decision::Approve => {
                script.approve_force_upload();
                resolution.approved.push(script);
            }
            Decision::Reject => resolution.rejected.push(script.name),
        }
    }

    info!(
        clean = resolution.clean.len(),
        approved = resolution.approved.len(),
        rejected = resolution.rejected.len(),
        "upload conflicts resolved"
    );
    Ok(resolution)
}

fn decide<P: Prompt>(
    script: &ScriptDescriptor,
    batch_size: usize,
    options: &ResolveOptions,
    mode: &mut BatchMode,
    prompt: &mut P,
) -> Result<Decision, PromptError> {
    if script.is_verified_clean() {
        return Ok(Decision::Clean);
    }

    match *mode {
        BatchMode::ForceAll => return Ok(Decision::Approve),
        BatchMode::ForceNone => return Ok(Decision::Reject),
        BatchMode::Normal => {}
    }

    let mut conflict = script.conflict;
    if conflict.is_empty() {
        match options.unverified {
            UnverifiedPolicy::Skip => {
                warn!(
                    script = %script.name,
                    "no last sync hash for script; skipping because it cannot be verified"
                );
                return Ok(Decision::Reject);
            }
            UnverifiedPolicy::Ask => {
                debug!(script = %script.name, "no last sync hash; treating as possibly changed");
                conflict = ConflictFlags::SOURCE_CODE;
            }
        }
    }

    if conflict.contains(ConflictFlags::CATEGORY) {
        let approved = if options.check_categories {
            let question = category_question(&script.name);
            ask_checked(prompt, &question, YES_NO)? == Some(Answer::Yes)
        } else {
            debug!(script = %script.name, "category checks disabled; ignoring category conflict");
            true
        };
        if !approved {
            return Ok(Decision::Reject);
        }
    }

    // Anything besides the category bit is a content conflict.
    let remaining = ConflictFlags::from_bits(conflict.bits() & !ConflictFlags::CATEGORY.bits());
    if remaining.is_empty() {
        return Ok(Decision::Approve);
    }

    let question = source_question(script);
    let offered = if batch_size > 1 { YES_NO_ALL_NONE } else { YES_NO };
    let decision = match ask_checked(prompt, &question, offered)? {
        Some(Answer::All) => {
            info!(script = %script.name, "approving all remaining scripts");
            *mode = BatchMode::ForceAll;
            Decision::Approve
        }
        Some(Answer::Yes) => Decision::Approve,
        Some(Answer::No) => Decision::Reject,
        _ => {
            info!(script = %script.name, "rejecting all remaining scripts");
            *mode = BatchMode::ForceNone;
            Decision::Reject
        }
    };
    Ok(decision)
}

fn category_question(name: &str) -> String {
    format!("Category of '{name}' differs from the server copy. Upload anyway?")
}

fn source_question(script: &ScriptDescriptor) -> String {
    let name = &script.name;
    if script.encrypted {
        format!("'{name}' is encrypted on the server and cannot be compared. Upload anyway?")
    } else if script.last_sync_hash.is_some() {
        format!("'{name}' has been changed on the server since the last sync. Upload anyway?")
    } else {
        format!("'{name}' might have been changed on the server. Upload anyway?")
    }
}
