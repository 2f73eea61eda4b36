//! Subcommand implementations.

pub mod prefs;
pub mod prompt;
pub mod status;
pub mod style;
pub mod upload;
