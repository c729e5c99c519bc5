//! Git fetch source

use std::path::Path;

use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::dependency::{Dependency, Locator};
use crate::library::{Library, Revision};
use crate::source::{FetchError, FetchSource, read_declared_dependencies};
use crate::version::{Version, select_latest};

pub const GIT_TYPE: &str = "git";

/// Schemes tried in order when a dependency has no url
const SYNTHESIZED_SCHEMES: [&str; 4] = ["https", "http", "git", "ssh"];

/// Fetches dependencies by cloning git repositories
pub struct GitSource {
    program: String,
}

impl GitSource {
    /// Creates a GitSource running the given git executable
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    async fn git(&self, dir: Option<&Path>, args: &[&str], import: &str) -> Result<String, FetchError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        debug!("Running git {}", args.join(" "));

        let output = command.output().await.map_err(FetchError::io(import))?;
        if !output.status.success() {
            return Err(FetchError::Command {
                import: import.to_string(),
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn clone(&self, url: &str, branch: &str, dest: &Path, import: &str) -> Result<(), FetchError> {
        let dest = dest.to_string_lossy();
        let mut args = vec!["clone", "--quiet"];
        if !branch.is_empty() {
            args.extend(["--branch", branch]);
        }
        args.extend([url, dest.as_ref()]);
        self.git(None, &args, import).await.map(|_| ())
    }

    /// Clone the dependency into `dest`, returning the url that worked
    async fn clone_dependency(&self, dep: &Dependency, dest: &Path) -> Result<Locator, FetchError> {
        if let Some(url) = &dep.url {
            self.clone(&url.to_string(), &dep.branch, dest, &dep.import).await?;
            return Ok(url.clone());
        }

        for scheme in SYNTHESIZED_SCHEMES {
            let url = format!("{}://{}", scheme, dep.import);
            warn!("Synthesizing url from import: '{}'", url);
            match self.clone(&url, &dep.branch, dest, &dep.import).await {
                Ok(()) => {
                    return Locator::parse(&url)
                        .map_err(|_| FetchError::Unreachable(dep.import.clone()));
                }
                Err(e) => {
                    warn!("Failed to fetch '{}': {}", url, e);
                    // clone needs an empty destination
                    if dest.exists() {
                        std::fs::remove_dir_all(dest).map_err(FetchError::io(&dep.import))?;
                        std::fs::create_dir(dest).map_err(FetchError::io(&dep.import))?;
                    }
                }
            }
        }
        Err(FetchError::Unreachable(dep.import.clone()))
    }

    async fn tags(&self, checkout: &Path, args: &[&str], import: &str) -> Result<Vec<String>, FetchError> {
        let output = self.git(Some(checkout), args, import).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn checkout(&self, checkout: &Path, revision: &str, import: &str) -> Result<(), FetchError> {
        self.git(Some(checkout), &["checkout", "--quiet", revision], import)
            .await
            .map(|_| ())
    }

    /// Check out the revision the dependency asks for and work out its version
    async fn pin(&self, dep: &Dependency, checkout: &Path) -> Result<(Version, Revision), FetchError> {
        let spec = &dep.version_spec;
        let import = dep.import.as_str();

        if !dep.commit.is_empty() {
            self.checkout(checkout, &dep.commit, import).await?;
            if spec.is_unversioned() {
                return Ok((Version::unversioned(), Revision::Commit(dep.commit.clone())));
            }
            let tags = self.tags(checkout, &["tag", "--points-at", "HEAD"], import).await?;
            let (_, version) = select_latest(spec, &tags).ok_or_else(|| FetchError::NoMatchingTag {
                import: import.to_string(),
                spec: *spec,
            })?;
            return Ok((version, Revision::Commit(dep.commit.clone())));
        }

        if !dep.tag.is_empty() {
            self.checkout(checkout, &dep.tag, import).await?;
            let version = match Version::parse(&dep.tag).ok() {
                Some(version) if spec.is_satisfied_by(&version) => version,
                None if spec.is_unversioned() => Version::unversioned(),
                _ => {
                    return Err(FetchError::Unsatisfied {
                        import: import.to_string(),
                        version: dep.tag.clone(),
                        spec: *spec,
                    });
                }
            };
            return Ok((version, Revision::Tag(dep.tag.clone())));
        }

        if spec.is_unversioned() {
            let head = self.git(Some(checkout), &["rev-parse", "HEAD"], import).await?;
            warn!("Resolved: {} (unversioned)", import);
            return Ok((Version::unversioned(), Revision::Commit(head.trim().to_string())));
        }

        let tags = self.tags(checkout, &["tag", "--list"], import).await?;
        let (tag, version) = select_latest(spec, &tags).ok_or_else(|| FetchError::NoMatchingTag {
            import: import.to_string(),
            spec: *spec,
        })?;
        self.checkout(checkout, tag, import).await?;
        Ok((version, Revision::Tag(tag.to_string())))
    }
}

impl Default for GitSource {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait::async_trait]
impl FetchSource for GitSource {
    fn source_type(&self) -> &str {
        GIT_TYPE
    }

    async fn fetch(&self, mut dep: Dependency) -> Result<Library, FetchError> {
        info!("Fetching git dependency: '{}'", dep.import);

        let artifact = TempDir::new().map_err(FetchError::io(&dep.import))?;
        let checkout = artifact.path();

        let url = self.clone_dependency(&dep, checkout).await?;
        dep.url = Some(url);

        let (version, revision) = self.pin(&dep, checkout).await?;
        let dependencies = read_declared_dependencies(checkout, &dep.import)?;

        info!("Resolved: {} {}", dep.import, version);
        let mut library = Library::new(dep);
        library.version = version;
        library.revision = revision;
        library.dependencies = dependencies;
        library.artifact = Some(artifact);
        Ok(library)
    }

    fn ignore_pattern(&self) -> Option<&'static str> {
        Some(r"^\.git$")
    }
}
