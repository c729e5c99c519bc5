//! Lock file writer
//!
//! A lock file uses the package file format, so `install` can resolve it
//! with the regular loader and get back the exact revisions recorded here.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::{DependencyDecl, PackageFile};
use crate::library::{Library, Revision};
use crate::resolver::Finalized;

#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("Cannot serialize lock file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lock entry pinning a library to the revision and version it resolved to
fn lock_entry(library: &Library) -> DependencyDecl {
    let dep = &library.dependency;
    let mut decl = DependencyDecl {
        import: dep.import.clone(),
        source_type: dep.source_type.clone(),
        url: dep.url.as_ref().map(ToString::to_string).unwrap_or_default(),
        branch: dep.branch.clone(),
        ..Default::default()
    };

    match &library.revision {
        Revision::Tag(tag) => decl.tag = tag.clone(),
        Revision::Commit(commit) => decl.commit = commit.clone(),
        Revision::Unpinned => {}
    }
    if !library.version.is_unversioned() {
        decl.version = format!("={}", library.version);
    }
    decl
}

/// Render the lock file contents for a finalized set, sorted by import
pub fn render_lockfile(finalized: &Finalized) -> Result<String, LockfileError> {
    let mut dependencies: Vec<DependencyDecl> = finalized.iter().map(lock_entry).collect();
    dependencies.sort_by(|a, b| a.import.cmp(&b.import));

    Ok(toml::to_string(&PackageFile { dependencies })?)
}

pub fn write_lockfile(path: &Path, finalized: &Finalized) -> Result<(), LockfileError> {
    let contents = render_lockfile(finalized)?;
    std::fs::write(path, contents).map_err(|source| LockfileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote {} libraries to {}", finalized.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::config::load_package_file;
    use crate::dependency::Dependency;
    use crate::version::{Version, VersionSpec};

    fn finalized() -> Finalized {
        let mut finalized = Finalized::new();

        let mut git = Library::new(
            Dependency::new("github.com/foo/bar", "https://github.com/foo/bar", ">=1")
                .unwrap()
                .with_type("git")
                .with_branch("main"),
        );
        git.version = Version::parse("1.4.2").unwrap();
        git.revision = Revision::Tag("v1.4.2".to_string());
        finalized.insert(git).unwrap();

        let mut head = Library::new(Dependency::new("example.com/head", "", "").unwrap().with_type("git"));
        head.revision = Revision::Commit("0123abcd".to_string());
        finalized.insert(head).unwrap();

        finalized
            .insert(Library::new(Dependency::new("fmt", "", "").unwrap().with_type("std")))
            .unwrap();
        finalized
    }

    #[test]
    fn render_lockfile_pins_revisions_sorted_by_import() {
        let rendered = render_lockfile(&finalized()).unwrap();

        let expected = r#"[[dependencies]]
import = "example.com/head"
type = "git"
commit = "0123abcd"

[[dependencies]]
import = "fmt"
type = "std"

[[dependencies]]
import = "github.com/foo/bar"
type = "git"
url = "https://github.com/foo/bar"
version = "=1.4.2"
branch = "main"
tag = "v1.4.2"
"#;
        assert_eq!(rendered, expected);
    }

    #[test]
    fn written_lockfile_loads_as_package_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grapnel-lock.toml");

        write_lockfile(&path, &finalized()).unwrap();
        let deps = load_package_file(&path).unwrap();

        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].commit, "0123abcd");
        assert_eq!(deps[1].source_type, "std");
        assert_eq!(deps[2].tag, "v1.4.2");
        assert_eq!(deps[2].version_spec, VersionSpec::parse("=1.4.2").unwrap());
        assert_eq!(deps[2].url.as_ref().unwrap().to_string(), "https://github.com/foo/bar");
    }

    #[test]
    fn write_lockfile_reports_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("grapnel-lock.toml");

        let result = write_lockfile(&path, &Finalized::new());

        assert!(matches!(result, Err(LockfileError::Write { .. })));
    }
}
