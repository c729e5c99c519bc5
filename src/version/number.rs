//! Concrete versions parsed from tags and archive names

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::ParseError;

/// Tolerant version grammar: any non-digit prefix, up to three dot-separated
/// integer groups, then a non-digit suffix.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\d]*(\d+)(?:\s*\.\s*(\d+))?(?:\s*\.\s*(\d+))?\s*[^\d]*$")
        .expect("version regex is valid")
});

/// A resolved version triple.
///
/// A component of `None` is unknown; it behaves like `-1` when compared against
/// a [`VersionSpec`](crate::version::VersionSpec) bound and sorts below `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: Option<u32>,
    pub minor: Option<u32>,
    pub subminor: Option<u32>,
}

impl Version {
    pub fn new(major: Option<u32>, minor: Option<u32>, subminor: Option<u32>) -> Self {
        Self {
            major,
            minor,
            subminor,
        }
    }

    /// The version recorded for libraries resolved without a version requirement
    pub fn unversioned() -> Self {
        Self::default()
    }

    pub fn is_unversioned(&self) -> bool {
        self.major.is_none()
    }

    /// Parse a version out of a tag or file name.
    ///
    /// Examples:
    /// - "v1.5" -> 1.5
    /// - "release.r60" -> 60
    /// - "r2015.01.24" -> 2015.1.24
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidVersion(text.to_string());
        let caps = VERSION_RE.captures(text).ok_or_else(invalid)?;

        let group = |idx: usize| -> Result<Option<u32>, ParseError> {
            caps.get(idx)
                .map(|m| m.as_str().parse::<u32>().map_err(|_| invalid()))
                .transpose()
        };

        Ok(Self {
            major: group(1)?,
            minor: group(2)?,
            subminor: group(3)?,
        })
    }

    /// Components widened to the comparison domain used by spec bounds
    pub(crate) fn components(&self) -> [i64; 3] {
        [self.major, self.minor, self.subminor].map(|c| c.map_or(-1, i64::from))
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(major) = self.major else {
            return f.write_str("*");
        };
        write!(f, "{}", major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
            if let Some(subminor) = self.subminor {
                write!(f, ".{}", subminor)?;
            }
        }
        Ok(())
    }
}
