//! Fetch sources
//!
//! A fetch source turns a canonical dependency into a [`Library`]: it
//! downloads the content into a temporary directory, settles on a concrete
//! version and reports the dependencies the library itself declares. Sources
//! are looked up by the dependency's `type` through a [`Registry`].

pub mod archive;
pub mod error;
pub mod git;
pub mod registry;
pub mod stdlib;

use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::config::{PACKAGE_FILE, load_package_file};
use crate::dependency::Dependency;
use crate::library::Library;

pub use archive::ArchiveSource;
pub use error::FetchError;
pub use git::GitSource;
pub use registry::Registry;
pub use stdlib::StdSource;

/// Trait for fetching a dependency of one source type
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FetchSource: Send + Sync {
    /// Returns the `type` value this source handles
    fn source_type(&self) -> &str;

    /// Checks that the dependency can be fetched by this source
    fn validate(&self, dep: &Dependency) -> Result<(), FetchError> {
        validate_revision(dep)
    }

    /// Fetches a dependency
    ///
    /// # Returns
    /// * `Ok(Library)` - The fetched library with its version, artifact and
    ///   declared dependencies
    /// * `Err(FetchError)` - If the fetch fails or no version satisfies the
    ///   dependency's version spec
    async fn fetch(&self, dep: Dependency) -> Result<Library, FetchError>;

    /// File name pattern to leave out when installing libraries of this source
    fn ignore_pattern(&self) -> Option<&'static str> {
        None
    }
}

/// A dependency may pin a tag or a commit, not both
pub fn validate_revision(dep: &Dependency) -> Result<(), FetchError> {
    if !dep.tag.is_empty() && !dep.commit.is_empty() {
        return Err(FetchError::TagAndCommit(dep.import.clone()));
    }
    Ok(())
}

/// Dependencies declared by the package file at the root of a fetched tree
pub fn read_declared_dependencies(root: &Path, import: &str) -> Result<Vec<Dependency>, FetchError> {
    let path = root.join(PACKAGE_FILE);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    load_package_file(&path).map_err(|source| FetchError::Manifest {
        import: import.to_string(),
        source,
    })
}
