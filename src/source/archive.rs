//! Archive fetch source
//!
//! Downloads a `.tar`, `.tar.gz`/`.tgz` or `.zip` file and extracts it. The
//! version of the library is taken from the archive's file name, so
//! `foo-1.2.tar.gz` resolves to version `1.2`.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use crate::dependency::{Dependency, Locator};
use crate::library::Library;
use crate::source::{FetchError, FetchSource, read_declared_dependencies};
use crate::version::Version;

pub const ARCHIVE_TYPE: &str = "archive";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Tar,
    TarGz,
    Zip,
}

impl ArchiveFormat {
    const EXTENSIONS: [(&'static str, ArchiveFormat); 4] = [
        (".tar.gz", ArchiveFormat::TarGz),
        (".tgz", ArchiveFormat::TarGz),
        (".tar", ArchiveFormat::Tar),
        (".zip", ArchiveFormat::Zip),
    ];

    /// Detect the format from a file name, returning it with the name's stem
    fn detect(file_name: &str) -> Option<(ArchiveFormat, &str)> {
        Self::EXTENSIONS.iter().find_map(|(ext, format)| {
            file_name.strip_suffix(ext).map(|stem| (*format, stem))
        })
    }
}

/// Fetches dependencies by downloading and extracting archives
pub struct ArchiveSource {
    client: reqwest::Client,
}

impl ArchiveSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("grapnel/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Copy the archive at `url` into `dest`
    async fn download(&self, url: &Locator, dest: &Path, import: &str) -> Result<(), FetchError> {
        if url.scheme == "file" {
            let path = local_path(url).ok_or_else(|| FetchError::Unreachable(import.to_string()))?;
            tokio::fs::copy(&path, dest)
                .await
                .map_err(FetchError::io(import))?;
            return Ok(());
        }

        let url = url.to_string();
        info!("Downloading '{}'", url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Download returned status {}: {}", status, url);
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(FetchError::io(import))
    }

    /// Unpack a zip archive into `dest` with the `unzip` tool
    async fn unzip(&self, archive: &Path, dest: &Path, import: &str) -> Result<(), FetchError> {
        let output = Command::new("unzip")
            .arg("-q")
            .arg(archive)
            .arg("-d")
            .arg(dest)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(FetchError::io(import))?;
        if !output.status.success() {
            return Err(FetchError::Command {
                import: import.to_string(),
                command: format!("unzip {}", archive.display()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ArchiveSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Filesystem path of a `file:` locator, with percent-encoding decoded
fn local_path(url: &Locator) -> Option<PathBuf> {
    Url::parse(&url.to_string()).ok()?.to_file_path().ok()
}

fn unpack_tar(format: ArchiveFormat, archive: &Path, dest: &Path) -> std::io::Result<()> {
    let file = File::open(archive)?;
    let reader: Box<dyn Read> = match format {
        ArchiveFormat::TarGz => Box::new(GzDecoder::new(file)),
        _ => Box::new(file),
    };
    tar::Archive::new(reader).unpack(dest)
}

/// Archives usually wrap their content in a single top-level directory;
/// returns that directory, or `root` when there is none.
fn content_root(root: &Path) -> std::io::Result<PathBuf> {
    let mut entries = std::fs::read_dir(root)?.collect::<Result<Vec<_>, _>>()?;
    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        if let Some(entry) = entries.pop() {
            return Ok(entry.path());
        }
    }
    Ok(root.to_path_buf())
}

/// Unpack the downloaded archive (zip archives are already extracted) and
/// move its content root into a fresh artifact directory.
///
/// Runs on the blocking pool.
fn prepare_artifact(
    format: ArchiveFormat,
    archive: &Path,
    extracted: &Path,
    import: &str,
) -> Result<(TempDir, Vec<Dependency>), FetchError> {
    std::fs::create_dir_all(extracted).map_err(FetchError::io(import))?;
    if format != ArchiveFormat::Zip {
        unpack_tar(format, archive, extracted).map_err(FetchError::io(import))?;
    }

    let artifact = TempDir::new().map_err(FetchError::io(import))?;
    content_root(extracted)
        .and_then(|root| move_contents(&root, artifact.path()))
        .map_err(FetchError::io(import))?;
    debug!("Extracted '{}' to {}", import, artifact.path().display());

    let dependencies = read_declared_dependencies(artifact.path(), import)?;
    Ok((artifact, dependencies))
}

/// Move the contents of `from` into `to`
fn move_contents(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        std::fs::rename(entry.path(), to.join(entry.file_name()))?;
    }
    Ok(())
}

/// Version encoded in an archive stem, checked against the dependency's spec
fn archive_version(dep: &Dependency, stem: &str) -> Result<Version, FetchError> {
    let spec = &dep.version_spec;
    if spec.is_unversioned() {
        return Ok(Version::unversioned());
    }
    match Version::parse(stem) {
        Ok(version) if spec.is_satisfied_by(&version) => Ok(version),
        _ => Err(FetchError::Unsatisfied {
            import: dep.import.clone(),
            version: stem.to_string(),
            spec: *spec,
        }),
    }
}

#[async_trait::async_trait]
impl FetchSource for ArchiveSource {
    fn source_type(&self) -> &str {
        ARCHIVE_TYPE
    }

    async fn fetch(&self, dep: Dependency) -> Result<Library, FetchError> {
        info!("Fetching archive dependency: '{}'", dep.import);
        let import = dep.import.as_str();

        let url = dep
            .url
            .as_ref()
            .ok_or_else(|| FetchError::MissingLocation(import.to_string()))?;
        let file_name = url.file_name();
        let (format, stem) = ArchiveFormat::detect(file_name)
            .ok_or_else(|| FetchError::UnsupportedArchive(file_name.to_string()))?;
        let version = archive_version(&dep, stem)?;

        let staging = TempDir::new().map_err(FetchError::io(import))?;
        let archive = staging.path().join(file_name);
        let extracted = staging.path().join("extracted");

        self.download(url, &archive, import).await?;
        if format == ArchiveFormat::Zip {
            self.unzip(&archive, &extracted, import).await?;
        }

        let owned_import = import.to_string();
        let (artifact, dependencies) = tokio::task::spawn_blocking(move || {
            prepare_artifact(format, &archive, &extracted, &owned_import)
        })
        .await
        .map_err(|e| FetchError::io(import)(std::io::Error::other(e)))??;

        info!("Resolved: {} {}", import, version);
        let mut library = Library::new(dep);
        library.version = version;
        library.artifact = Some(artifact);
        library.dependencies = dependencies;
        Ok(library)
    }
}
