use thiserror::Error;

use crate::version::ParseError;

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("Must have an 'import' or 'url' specified")]
    MissingLocation,

    #[error("Invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Url must have a scheme specified: '{0}'")]
    MissingScheme(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] ParseError),

    #[error("Unknown dependency field: '{0}'")]
    UnknownField(String),
}
