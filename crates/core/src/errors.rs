//! Error types for the scriptsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

// ---------------------------------------------------------------------------
// Prompt errors
// ---------------------------------------------------------------------------

/// Failures of the interactive prompt channel itself.
///
/// An operator declining or dismissing a question is *not* an error; it is
/// reported as an answer (or `None`) by the [`crate::conflict::Prompt`].
#[derive(Debug, Error)]
pub enum PromptError {
    /// The terminal or UI channel could not be used.
    #[error("prompt I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The prompt returned an option it was not offered.
    #[error("prompt returned unexpected answer '{answer}' for question: {question}")]
    UnexpectedAnswer {
        question: String,
        answer: String,
    },

    /// No interactive channel is available (e.g. stdin is not a terminal).
    #[error("no interactive prompt available: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Script store errors
// ---------------------------------------------------------------------------

/// Errors from the remote script store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store root does not exist.
    #[error("script store not found at '{0}'")]
    RootNotFound(String),

    /// The store manifest could not be parsed or written.
    #[error("script store manifest error: {0}")]
    ManifestError(String),

    /// A script name cannot be mapped to a storage location.
    #[error("invalid script name '{0}'")]
    InvalidName(String),

    /// Generic I/O wrapper.
    #[error("script store I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Local source errors
// ---------------------------------------------------------------------------

/// Errors reading local script files.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The scripts directory does not exist.
    #[error("scripts directory not found: {0}")]
    DirectoryNotFound(String),

    /// The name cannot be mapped to a file inside the scripts directory.
    #[error("invalid script name '{0}'")]
    InvalidName(String),

    /// The requested script has no local file.
    #[error("local script '{name}' not found at '{path}'")]
    NotFound {
        name: String,
        path: String,
    },

    /// Generic I/O wrapper.
    #[error("local source I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Upload errors
// ---------------------------------------------------------------------------

/// Errors from the upload workflow.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload prompt error: {0}")]
    PromptError(#[from] PromptError),

    #[error("upload store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("upload source error: {0}")]
    SourceError(#[from] SourceError),

    #[error("upload database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Database errors
// ---------------------------------------------------------------------------

/// Errors from the SQLite persistence layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Underlying rusqlite error.
    #[error("database error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// A migration failed.
    #[error("database migration failed (version {version}): {detail}")]
    MigrationFailed {
        version: u32,
        detail: String,
    },

    /// A stored value could not be interpreted.
    #[error("invalid {entity} value in database: {value}")]
    InvalidValue {
        entity: String,
        value: String,
    },

    /// Generic I/O error (e.g. file permissions).
    #[error("database I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = SourceError::NotFound {
            name: "invoice".into(),
            path: "/tmp/scripts/invoice.js".into(),
        };
        assert_eq!(
            err.to_string(),
            "local script 'invoice' not found at '/tmp/scripts/invoice.js'"
        );

        let err = StoreError::InvalidName("../etc".into());
        assert_eq!(err.to_string(), "invalid script name '../etc'");

        let err = ConfigError::InvalidValue {
            field: "workspace.extension".into(),
            detail: "must not be empty".into(),
        };
        assert!(err.to_string().contains("workspace.extension"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let err: CoreError = PromptError::Unavailable("not a tty".into()).into();
        assert!(matches!(err, CoreError::Prompt(_)));

        let err: CoreError = StoreError::RootNotFound("/srv".into()).into();
        assert!(matches!(err, CoreError::Store(_)));
    }

    #[test]
    fn test_upload_error_wraps_prompt_error() {
        let err: UploadError = PromptError::Unavailable("closed".into()).into();
        assert!(err.to_string().starts_with("upload prompt error"));
    }
}
