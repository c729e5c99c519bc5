use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Cannot parse version: '{0}'")]
    InvalidVersion(String),

    #[error("Cannot parse version spec: '{0}'")]
    InvalidSpec(String),
}
