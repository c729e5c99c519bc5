use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::version::VersionSpec;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Cannot specify both tag and commit for '{0}'")]
    TagAndCommit(String),

    #[error("No url to fetch '{0}' from")]
    MissingLocation(String),

    #[error("Cannot download dependency: '{0}'")]
    Unreachable(String),

    #[error("I/O error while fetching '{import}': {source}")]
    Io {
        import: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed for '{import}': {stderr}")]
    Command {
        import: String,
        command: String,
        stderr: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} downloading '{url}'")]
    Status { url: String, status: u16 },

    #[error("Cannot find a tag of '{import}' for version specification {spec}")]
    NoMatchingTag { import: String, spec: VersionSpec },

    #[error("Version '{version}' of '{import}' does not satisfy {spec}")]
    Unsatisfied {
        import: String,
        version: String,
        spec: VersionSpec,
    },

    #[error("Unsupported archive format: '{0}'")]
    UnsupportedArchive(String),

    #[error("Cannot read dependencies declared by '{import}': {source}")]
    Manifest {
        import: String,
        #[source]
        source: ConfigError,
    },

    #[error("Fetching '{import}' timed out after {timeout:?}")]
    TimedOut { import: String, timeout: Duration },
}

impl FetchError {
    pub(crate) fn io(import: &str) -> impl FnOnce(io::Error) -> FetchError + '_ {
        move |source| FetchError::Io {
            import: import.to_string(),
            source,
        }
    }
}
