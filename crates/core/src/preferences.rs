//! The upload-on-save question.
//!
//! When a script is saved locally the operator is asked whether to upload
//! it. "Always" and "Never" are remembered per script so the question is
//! only asked until the operator settles on a standing answer.

use tracing::{debug, info};

use crate::conflict::prompt::{ask_checked, YES_NO_ALWAYS_NEVER};
use crate::conflict::{Answer, Prompt};
use crate::db::{Database, UploadPolicy};
use crate::errors::UploadError;

/// Decide whether a freshly saved script should be uploaded.
pub fn ensure_upload_on_save<P: Prompt>(
    name: &str,
    db: &Database,
    mut prompt: P,
) -> Result<bool, UploadError> {
    match db.get_upload_preference(name)? {
        Some(UploadPolicy::Always) => {
            debug!(script = name, "upload on save: always");
            return Ok(true);
        }
        Some(UploadPolicy::Never) => {
            debug!(script = name, "upload on save: never");
            return Ok(false);
        }
        None => {}
    }

    let question = format!("Upload '{name}' now?");
    let upload = match ask_checked(&mut prompt, &question, YES_NO_ALWAYS_NEVER)? {
        Some(Answer::Yes) => true,
        Some(Answer::Always) => {
            db.set_upload_preference(name, UploadPolicy::Always)?;
            info!(script = name, "remembering: always upload on save");
            true
        }
        Some(Answer::Never) => {
            db.set_upload_preference(name, UploadPolicy::Never)?;
            info!(script = name, "remembering: never upload on save");
            false
        }
        _ => false,
    };
    Ok(upload)
}
