//! Declared dependencies
//!
//! A [`Dependency`] is created from a declaration (package file, lock file, or
//! a library's own manifest), canonicalized in place by rewrite rules, and then
//! handed to exactly one fetch source.

pub mod error;
pub mod fields;
pub mod locator;

use std::collections::BTreeMap;

pub use error::DependencyError;
pub use fields::{FIELDS, FieldAccessor, field};
pub use locator::Locator;

use crate::version::{Version, VersionSpec};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dependency {
    /// Logical import path; the identity of the dependency across a resolution
    pub import: String,
    pub url: Option<Locator>,
    /// Fetch source kind (`git`, `archive`, `std`, ...); empty until rewritten
    pub source_type: String,
    pub branch: String,
    pub tag: String,
    pub commit: String,
    pub version_spec: VersionSpec,
}

impl Dependency {
    /// Build a dependency from declared strings.
    ///
    /// An empty `version` means unversioned. When `import` is empty it is
    /// derived from the url as `<host><path>`.
    pub fn new(import: &str, url: &str, version: &str) -> Result<Self, DependencyError> {
        let url = url.trim();
        let url = if url.is_empty() {
            None
        } else {
            let locator = Locator::parse(url).map_err(|source| match source {
                url::ParseError::RelativeUrlWithoutBase => {
                    DependencyError::MissingScheme(url.to_string())
                }
                source => DependencyError::InvalidUrl {
                    url: url.to_string(),
                    source,
                },
            })?;
            Some(locator)
        };

        let version = version.trim();
        let version_spec = if version.is_empty() {
            VersionSpec::unversioned()
        } else {
            VersionSpec::parse(version)?
        };

        let import = match (import.trim(), &url) {
            ("", Some(locator)) => format!("{}{}", locator.host, locator.path),
            ("", None) => return Err(DependencyError::MissingLocation),
            (import, _) => import.to_string(),
        };

        Ok(Self {
            import,
            url,
            version_spec,
            ..Default::default()
        })
    }

    pub fn with_type(mut self, source_type: &str) -> Self {
        self.source_type = source_type.to_string();
        self
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn with_commit(mut self, commit: &str) -> Self {
        self.commit = commit.to_string();
        self
    }

    /// Snapshot of every rewritable field by name.
    ///
    /// Locator parts (`scheme`, `host`, `port`, `path`, `url`) are empty
    /// strings when the dependency has no url.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        FIELDS
            .iter()
            .map(|f| (f.name.to_string(), f.get(self)))
            .collect()
    }

    /// Write named field values back onto the dependency.
    ///
    /// Values are applied in table order regardless of map order. Unknown
    /// names are rejected before anything is written.
    pub fn set_values(&mut self, values: &BTreeMap<String, String>) -> Result<(), DependencyError> {
        if let Some(unknown) = values.keys().find(|name| field(name).is_none()) {
            return Err(DependencyError::UnknownField(unknown.clone()));
        }
        for accessor in FIELDS.iter() {
            if let Some(value) = values.get(accessor.name) {
                accessor.set(self, value)?;
            }
        }
        Ok(())
    }

    /// Returns true if this declaration's constraint is at least as narrow as `other`'s
    pub fn outranks(&self, other: &Dependency) -> bool {
        self.version_spec.outranks(&other.version_spec)
    }

    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        self.version_spec.is_satisfied_by(version)
    }
}
