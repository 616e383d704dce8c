//! Template search-path resolution.
//!
//! Document templates are looked up through an ordered list of search
//! directories: directories added later take precedence, mirroring how
//! subclass configuration overrides inherited defaults. The framework
//! seeds the list with the user's per-project data directory when one
//! exists.

use crate::error::PathError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered template lookup.
#[derive(Debug, Clone, Default)]
pub struct TemplateResolver {
    // Highest precedence first.
    dirs: Vec<PathBuf>,
}

impl TemplateResolver {
    /// Empty resolver; every lookup fails until directories are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver seeded with the user's data directory for this tool,
    /// when the platform exposes one.
    pub fn with_user_dirs() -> Self {
        let mut resolver = Self::new();
        if let Some(dirs) = ProjectDirs::from("", "", "examforge") {
            resolver.push(dirs.data_dir().join("templates"));
        }
        resolver
    }

    /// Add a directory with highest precedence. Re-adding an already
    /// known directory moves it to the front instead of duplicating it.
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.dirs.retain(|known| known != &dir);
        self.dirs.insert(0, dir);
    }

    /// Directories in precedence order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find the first existing file called `name`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, PathError> {
        for dir in &self.dirs {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!(template = name, path = %candidate.display(), "resolved template");
                return Ok(candidate);
            }
        }
        Err(PathError::NotFound {
            name: name.to_string(),
            searched: self.dirs.len(),
        })
    }

    /// Check that every registered directory actually is one. Missing
    /// directories are legal (they may be created later); files are not.
    pub fn validate(&self) -> Result<(), PathError> {
        for dir in &self.dirs {
            if dir.exists() && !dir.is_dir() {
                return Err(PathError::NotADirectory(dir.clone()));
            }
        }
        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory, like the shell
/// would for CLI arguments.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
