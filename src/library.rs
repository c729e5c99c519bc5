//! Fetched libraries and their installation

use std::io;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::dependency::Dependency;
use crate::version::Version;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Could not install '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error while walking dependency file tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// The revision a library was pinned to when fetched
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Revision {
    #[default]
    Unpinned,
    Tag(String),
    Commit(String),
}

/// A dependency that has been fetched and resolved to a concrete version
#[derive(Debug)]
pub struct Library {
    /// The canonical (rewritten) dependency this library was fetched for
    pub dependency: Dependency,
    pub version: Version,
    pub revision: Revision,
    /// Fetched content; `None` for sources with nothing to install
    pub artifact: Option<TempDir>,
    /// Dependencies this library declares
    pub dependencies: Vec<Dependency>,
    /// Additional import paths this library satisfies
    pub provides: Vec<String>,
}

impl Library {
    pub fn new(dependency: Dependency) -> Self {
        Self {
            dependency,
            version: Version::unversioned(),
            revision: Revision::Unpinned,
            artifact: None,
            dependencies: Vec::new(),
            provides: Vec::new(),
        }
    }

    pub fn import(&self) -> &str {
        &self.dependency.import
    }

    pub fn source_type(&self) -> &str {
        &self.dependency.source_type
    }

    /// Directory the library is installed into under `root`.
    ///
    /// Only the normal components of the import are used, so an import can
    /// never escape `root`.
    pub fn install_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for component in Path::new(self.import()).components() {
            if let Component::Normal(part) = component {
                path.push(part);
            }
        }
        path
    }

    /// Copy the artifact into `root/<import>`, replacing anything already there.
    ///
    /// Entries whose file name matches `ignore_pattern` are skipped; a matching
    /// directory is skipped with everything below it.
    pub fn install(&self, root: &Path, ignore_pattern: Option<&str>) -> Result<(), InstallError> {
        let Some(artifact) = &self.artifact else {
            debug!("Nothing to install for '{}'", self.import());
            return Ok(());
        };

        let ignore = ignore_pattern
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| InstallError::InvalidIgnorePattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        let target = self.install_path(root);
        if target.exists() {
            std::fs::remove_dir_all(&target).map_err(|source| InstallError::Io {
                path: target.clone(),
                source,
            })?;
        }
        create_dir(&target)?;

        let source_root = artifact.path();
        let walker = WalkDir::new(source_root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !ignore.as_ref().is_some_and(|regex| regex.is_match(&name))
            });

        for entry in walker {
            let entry = entry?;
            let Ok(relative) = entry.path().strip_prefix(source_root) else {
                continue;
            };
            let dest = target.join(relative);

            if entry.file_type().is_dir() {
                create_dir(&dest)?;
            } else if entry.file_type().is_file() {
                if let Some(parent) = dest.parent() {
                    create_dir(parent)?;
                }
                std::fs::copy(entry.path(), &dest).map_err(|source| InstallError::Io {
                    path: dest.clone(),
                    source,
                })?;
            } else {
                debug!("Skipping special file: {}", entry.path().display());
            }
        }

        debug!("Installed '{}' to {}", self.import(), target.display());
        Ok(())
    }

    /// Release the fetched artifact. Safe to call more than once.
    pub fn destroy(&mut self) -> io::Result<()> {
        match self.artifact.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

fn create_dir(path: &Path) -> Result<(), InstallError> {
    std::fs::create_dir_all(path).map_err(|source| InstallError::Io {
        path: path.to_path_buf(),
        source,
    })
}
