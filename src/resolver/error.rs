use thiserror::Error;

use crate::rewrite::RewriteError;
use crate::source::FetchError;
use crate::version::{Version, VersionSpec};

/// Why two requirements on the same import cannot both hold
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("neither {0} nor {1} outranks the other")]
    Specs(VersionSpec, VersionSpec),

    #[error("resolved version {version} does not satisfy {spec}")]
    Resolved { version: Version, spec: VersionSpec },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Cannot reconcile '{import}': {conflict}")]
    Reconciliation { import: String, conflict: Conflict },

    #[error("Import '{import}' is already provided by '{owner}'")]
    Collision { import: String, owner: String },

    #[error("No fetch source for type '{source_type}' of '{import}'")]
    NoSource { import: String, source_type: String },

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("one or more errors while resolving dependencies")]
    Aggregate(Vec<ResolveError>),
}

impl ResolveError {
    /// The errors this error stands for; an aggregate is flattened
    pub fn causes(&self) -> Vec<&ResolveError> {
        match self {
            ResolveError::Aggregate(errors) => errors.iter().flat_map(|e| e.causes()).collect(),
            other => vec![other],
        }
    }
}
