use thiserror::Error;

use crate::dependency::DependencyError;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Rewrite rule refers to unknown field: '{0}'")]
    UnknownField(String),

    #[error("Invalid match expression for '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid replace expression for '{field}': {source}")]
    InvalidTemplate {
        field: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Error executing replacement for '{field}' of '{import}': {source}")]
    Render {
        import: String,
        field: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    #[error("Cannot apply rewrite to '{import}': {source}")]
    Apply {
        import: String,
        #[source]
        source: DependencyError,
    },
}
