//! Reading local script files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::SourceError;
use crate::models::{is_valid_script_name, ScriptDescriptor};

/// First-line marker declaring a script's category.
pub const CATEGORY_MARKER: &str = "// #category ";

/// A directory of local scripts, one file per script.
#[derive(Debug, Clone)]
pub struct LocalSource {
    dir: PathBuf,
    extension: String,
}

impl LocalSource {
    pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.extension))
    }

    /// Read one script into a fresh descriptor.
    pub fn read_script(&self, name: &str) -> Result<ScriptDescriptor, SourceError> {
        if !is_valid_script_name(name) {
            return Err(SourceError::InvalidName(name.to_string()));
        }
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(SourceError::NotFound {
                name: name.to_string(),
                path: path.display().to_string(),
            });
        }

        let source_code = std::fs::read_to_string(&path)?;
        let mut script = ScriptDescriptor::new(name, source_code);
        script.category = parse_category(&script.source_code);
        debug!(script = name, path = %path.display(), "read local script");
        Ok(script)
    }

    /// Names of all local scripts, sorted.
    pub fn list_scripts(&self) -> Result<Vec<String>, SourceError> {
        if !self.dir.is_dir() {
            return Err(SourceError::DirectoryNotFound(self.dir.display().to_string()));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_script_name(stem) => names.push(stem.to_string()),
                _ => debug!(path = %path.display(), "ignoring file with unusable name"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read every script in the directory.
    pub fn read_all(&self) -> Result<Vec<ScriptDescriptor>, SourceError> {
        self.list_scripts()?
            .iter()
            .map(|name| self.read_script(name))
            .collect()
    }
}

fn parse_category(source: &str) -> Option<String> {
    let first = source.lines().next()?;
    let rest = first.trim().strip_prefix(CATEGORY_MARKER.trim_end())?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let category = rest.trim();
    (!category.is_empty()).then(|| category.to_string())
}
