//! Fetch source test utilities

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use grapnel::dependency::Dependency;
use grapnel::library::{Library, Revision};
use grapnel::resolver::Resolver;
use grapnel::rewrite::standard_rules;
use grapnel::source::{FetchError, FetchSource, Registry, StdSource};
use grapnel::version::Version;

/// A library the mock source can serve
#[derive(Clone, Default)]
struct MockPackage {
    version: String,
    dependencies: Vec<String>,
    files: Vec<(String, String)>,
}

/// In-memory fetch source serving a fixed set of packages
pub struct MockSource {
    source_type: String,
    packages: HashMap<String, MockPackage>,
    fetched: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new(source_type: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            packages: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Serve `import` at `version`, declaring `dependencies` by import
    pub fn with_package(mut self, import: &str, version: &str, dependencies: Vec<&str>) -> Self {
        let package = self.packages.entry(import.to_string()).or_default();
        package.version = version.to_string();
        package.dependencies = dependencies.into_iter().map(|d| d.to_string()).collect();
        self
    }

    /// Add a file to the artifact served for `import`
    pub fn with_file(mut self, import: &str, name: &str, content: &str) -> Self {
        self.packages
            .entry(import.to_string())
            .or_default()
            .files
            .push((name.to_string(), content.to_string()));
        self
    }

    /// Imports fetched so far, in fetch order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

fn write_files(root: &Path, files: &[(String, String)]) {
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

#[async_trait]
impl FetchSource for MockSource {
    fn source_type(&self) -> &str {
        &self.source_type
    }

    async fn fetch(&self, dep: Dependency) -> Result<Library, FetchError> {
        self.fetched.lock().unwrap().push(dep.import.clone());

        let package = self
            .packages
            .get(&dep.import)
            .ok_or_else(|| FetchError::Unreachable(dep.import.clone()))?;

        let version = Version::parse(&package.version).unwrap_or_default();
        if !dep.is_satisfied_by(&version) {
            return Err(FetchError::Unsatisfied {
                import: dep.import.clone(),
                version: package.version.clone(),
                spec: dep.version_spec,
            });
        }

        let artifact = TempDir::new().unwrap();
        write_files(artifact.path(), &package.files);

        let dependencies = package
            .dependencies
            .iter()
            .map(|import| Dependency::new(import, "", "").unwrap())
            .collect();

        let mut library = Library::new(dep);
        library.version = version;
        library.revision = Revision::Tag(format!("v{}", package.version));
        library.artifact = Some(artifact);
        library.dependencies = dependencies;
        Ok(library)
    }

    fn ignore_pattern(&self) -> Option<&'static str> {
        Some(r"^\.git$")
    }
}

/// Resolver using the built-in rewrite rules, the std source and `git`
pub fn create_test_resolver(git: Arc<MockSource>) -> Resolver {
    let mut registry = Registry::new(standard_rules());
    registry.register(Arc::new(StdSource));
    registry.register(git);
    Resolver::new(Arc::new(registry))
}
