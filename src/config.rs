use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dependency::{Dependency, DependencyError};
use crate::rewrite::{RewriteError, RewriteRule, RewriteRules};

// =============================================================================
// File names
// =============================================================================

/// Package file declaring the root dependencies
pub const PACKAGE_FILE: &str = "grapnel.toml";

/// Lock file pinning a resolved dependency set
pub const LOCK_FILE: &str = "grapnel-lock.toml";

/// Directory libraries are installed into
pub const TARGET_DIR: &str = "src";

/// Rewrite rule file looked up in the working and home directories
pub const RC_FILE: &str = ".grapnelrc";

/// System-wide rewrite rule file
pub const SYSTEM_RC_FILE: &str = "/etc/grapnelrc";

// =============================================================================
// Time-related constants
// =============================================================================

/// Time allowed for fetching a single dependency (5 minutes)
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Dependency #{index}: {source}")]
    Dependency {
        index: usize,
        #[source]
        source: DependencyError,
    },

    #[error("Rewrite rule #{index}: {source}")]
    Rewrite {
        index: usize,
        #[source]
        source: RewriteError,
    },
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// Package and lock files
// =============================================================================

/// Contents of a package or lock file
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct PackageFile {
    pub dependencies: Vec<DependencyDecl>,
}

/// One `[[dependencies]]` entry
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DependencyDecl {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub import: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub source_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub commit: String,
}

impl DependencyDecl {
    pub fn to_dependency(&self) -> Result<Dependency, DependencyError> {
        Ok(Dependency::new(&self.import, &self.url, &self.version)?
            .with_type(&self.source_type)
            .with_branch(&self.branch)
            .with_tag(&self.tag)
            .with_commit(&self.commit))
    }
}

impl PackageFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    /// Declared dependencies in file order
    pub fn dependencies(&self) -> Result<Vec<Dependency>, ConfigError> {
        self.dependencies
            .iter()
            .enumerate()
            .map(|(index, decl)| {
                decl.to_dependency()
                    .map_err(|source| ConfigError::Dependency { index, source })
            })
            .collect()
    }
}

/// Load the dependencies declared by a package or lock file
pub fn load_package_file(path: &Path) -> Result<Vec<Dependency>, ConfigError> {
    PackageFile::load(path)?.dependencies()
}

// =============================================================================
// Rewrite rule file
// =============================================================================

/// Contents of a `.grapnelrc` file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RcFile {
    pub rewrite: Vec<RewriteDecl>,
    pub resolver: ResolverConfig,
}

/// One `[[rewrite]]` entry: `match` and `replace` tables keyed by field name
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RewriteDecl {
    #[serde(rename = "match")]
    pub matches: BTreeMap<String, String>,
    #[serde(rename = "replace")]
    pub replacements: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    pub fetch_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl ResolverConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl RcFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    /// Compile the declared rewrite rules in file order
    pub fn rewrite_rules(&self) -> Result<RewriteRules, ConfigError> {
        self.rewrite
            .iter()
            .enumerate()
            .map(|(index, decl)| {
                RewriteRule::new(&decl.matches, &decl.replacements)
                    .map_err(|source| ConfigError::Rewrite { index, source })
            })
            .collect()
    }
}

/// Load the rewrite rules declared in an rc file
pub fn load_rewrite_rules(path: &Path) -> Result<RewriteRules, ConfigError> {
    RcFile::load(path)?.rewrite_rules()
}

/// Returns the first rc file that exists, checking the working directory,
/// the home directory and then [`SYSTEM_RC_FILE`].
pub fn find_rc_file() -> Option<PathBuf> {
    find_rc_file_in(std::env::current_dir().ok(), dirs::home_dir())
}

fn find_rc_file_in(cwd: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    cwd.map(|dir| dir.join(RC_FILE))
        .into_iter()
        .chain(home_dir.map(|home| home.join(RC_FILE)))
        .chain(std::iter::once(PathBuf::from(SYSTEM_RC_FILE)))
        .find(|path| path.is_file())
}
