//! Standard library passthrough

use tracing::debug;

use crate::dependency::Dependency;
use crate::library::Library;
use crate::source::FetchError;
use crate::source::FetchSource;

pub const STD_TYPE: &str = "std";

/// Resolves standard library imports without fetching anything.
///
/// The toolchain already provides these packages, so the library is
/// unversioned and has no artifact to install.
#[derive(Debug, Default)]
pub struct StdSource;

#[async_trait::async_trait]
impl FetchSource for StdSource {
    fn source_type(&self) -> &str {
        STD_TYPE
    }

    async fn fetch(&self, dep: Dependency) -> Result<Library, FetchError> {
        debug!("Standard import: '{}'", dep.import);
        Ok(Library::new(dep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_returns_unversioned_library_without_artifact() {
        let dep = Dependency::new("fmt", "", "").unwrap().with_type(STD_TYPE);

        let library = StdSource.fetch(dep.clone()).await.unwrap();

        assert_eq!(library.dependency, dep);
        assert!(library.version.is_unversioned());
        assert!(library.artifact.is_none());
        assert!(library.dependencies.is_empty());
    }
}
