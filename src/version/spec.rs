//! Version range constraints
//!
//! A spec is an operator applied to a version triple whose components may be
//! wildcards:
//! - `1.2.3`, `=1.2` - exact match on the given components
//! - `>=1.0.*`, `>2`, `<1.1.1`, `<= 1.*.*` - comparison operators
//! - `*` in the major position - unversioned, any version is acceptable
//!
//! Each component is expanded into an inclusive `[min, max]` bound when the
//! spec is built. A wildcard widens its own component to the full range no
//! matter which operator is used, so `>2.0` only narrows the major component.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::ParseError;
use crate::version::number::Version;

static SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(<=|>=|<|=|>)?\s*(\d+|\*)(?:\s*\.\s*(\d+|\*))?(?:\s*\.\s*(\d+|\*))?\s*$",
    )
    .expect("version spec regex is valid")
});

/// Comparison operator of a [`VersionSpec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    Lt,
    Lte,
    #[default]
    Eq,
    Gte,
    Gt,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "=",
            Operator::Gte => ">=",
            Operator::Gt => ">",
        }
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "=" | "" => Ok(Operator::Eq),
            ">=" => Ok(Operator::Gte),
            ">" => Ok(Operator::Gt),
            _ => Err(()),
        }
    }
}

/// Inclusive range of acceptable values for one version component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bound {
    pub min: i64,
    pub max: i64,
}

impl Bound {
    const UNBOUNDED: Bound = Bound {
        min: i64::MIN,
        max: i64::MAX,
    };

    fn expand(oper: Operator, value: Option<u32>) -> Self {
        let Some(value) = value.map(i64::from) else {
            return Self::UNBOUNDED;
        };
        match oper {
            Operator::Lt => Bound {
                min: i64::MIN,
                max: value - 1,
            },
            Operator::Lte => Bound {
                min: i64::MIN,
                max: value,
            },
            Operator::Eq => Bound {
                min: value,
                max: value,
            },
            Operator::Gte => Bound {
                min: value,
                max: i64::MAX,
            },
            Operator::Gt => Bound {
                min: value + 1,
                max: i64::MAX,
            },
        }
    }

    fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    fn within(&self, other: &Bound) -> bool {
        self.min >= other.min && self.max <= other.max
    }
}

/// A version constraint with its per-component bounds precomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionSpec {
    oper: Operator,
    major: Option<u32>,
    minor: Option<u32>,
    subminor: Option<u32>,
    bounds: [Bound; 3],
}

impl VersionSpec {
    pub fn new(
        oper: Operator,
        major: Option<u32>,
        minor: Option<u32>,
        subminor: Option<u32>,
    ) -> Self {
        Self {
            oper,
            major,
            minor,
            subminor,
            bounds: [
                Bound::expand(oper, major),
                Bound::expand(oper, minor),
                Bound::expand(oper, subminor),
            ],
        }
    }

    /// A spec that accepts any version, used when a dependency declares none
    pub fn unversioned() -> Self {
        Self::new(Operator::Eq, None, None, None)
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidSpec(text.to_string());
        let caps = SPEC_RE.captures(text).ok_or_else(invalid)?;

        let oper = caps
            .get(1)
            .map_or(Ok(Operator::Eq), |m| m.as_str().parse())
            .map_err(|_| invalid())?;

        let component = |idx: usize| -> Result<Option<u32>, ParseError> {
            match caps.get(idx).map(|m| m.as_str()) {
                None | Some("*") => Ok(None),
                Some(digits) => digits.parse::<u32>().map(Some).map_err(|_| invalid()),
            }
        };

        Ok(Self::new(oper, component(2)?, component(3)?, component(4)?))
    }

    pub fn oper(&self) -> Operator {
        self.oper
    }

    pub fn major(&self) -> Option<u32> {
        self.major
    }

    pub fn minor(&self) -> Option<u32> {
        self.minor
    }

    pub fn subminor(&self) -> Option<u32> {
        self.subminor
    }

    pub fn bounds(&self) -> &[Bound; 3] {
        &self.bounds
    }

    pub fn is_unversioned(&self) -> bool {
        self.major.is_none()
    }

    /// Returns true if every component of `version` falls inside this spec's bounds
    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        self.bounds
            .iter()
            .zip(version.components())
            .all(|(bound, value)| bound.contains(value))
    }

    /// Returns true if this spec's range is contained in `other`'s range on every component.
    ///
    /// This is a tie-break between two declarations of the same import, not an
    /// ordering: equal specs outrank each other, and disjoint or overlapping
    /// specs may outrank in neither direction.
    pub fn outranks(&self, other: &VersionSpec) -> bool {
        self.bounds
            .iter()
            .zip(other.bounds.iter())
            .all(|(mine, theirs)| mine.within(theirs))
    }
}

impl Default for VersionSpec {
    fn default() -> Self {
        Self::unversioned()
    }
}

impl FromStr for VersionSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |c: Option<u32>| c.map_or_else(|| "*".to_string(), |v| v.to_string());
        write!(
            f,
            "{}{}.{}.{}",
            self.oper.as_str(),
            show(self.major),
            show(self.minor),
            show(self.subminor)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn spec(text: &str) -> VersionSpec {
        VersionSpec::parse(text).unwrap()
    }

    #[rstest]
    #[case(">1.0", VersionSpec::new(Operator::Gt, Some(1), Some(0), None))]
    #[case("=1.1", VersionSpec::new(Operator::Eq, Some(1), Some(1), None))]
    #[case("<1.1.1", VersionSpec::new(Operator::Lt, Some(1), Some(1), Some(1)))]
    #[case(" <= 1.*.* ", VersionSpec::new(Operator::Lte, Some(1), None, None))]
    #[case(" >= 100.0.* ", VersionSpec::new(Operator::Gte, Some(100), Some(0), None))]
    #[case(" 5 ", VersionSpec::new(Operator::Eq, Some(5), None, None))]
    #[case("1 . 2", VersionSpec::new(Operator::Eq, Some(1), Some(2), None))]
    #[case("*", VersionSpec::unversioned())]
    fn parse_accepts_valid_specs(#[case] input: &str, #[case] expected: VersionSpec) {
        assert_eq!(spec(input), expected);
    }

    #[rstest]
    #[case("v1.0")]
    #[case("1.0xyz")]
    #[case("1.1.1.1")]
    #[case("=>1")]
    #[case("==1")]
    #[case("")]
    #[case("1.")]
    fn parse_rejects_invalid_specs(#[case] input: &str) {
        assert_eq!(
            VersionSpec::parse(input),
            Err(ParseError::InvalidSpec(input.to_string()))
        );
    }

    #[test]
    fn wildcards_expand_to_unbounded_components() {
        let parsed = spec(">=1.0.*");
        assert_eq!(
            parsed.bounds(),
            &[
                Bound {
                    min: 1,
                    max: i64::MAX
                },
                Bound {
                    min: 0,
                    max: i64::MAX
                },
                Bound::UNBOUNDED,
            ]
        );
        assert_eq!(spec(">2.0").bounds()[2], Bound::UNBOUNDED);
        assert_eq!(spec(">2").bounds()[1], Bound::UNBOUNDED);
    }

    #[rstest]
    #[case(">=1.0.*")]
    #[case("<1.1.1")]
    #[case(" 5 ")]
    #[case("<= 1.*.*")]
    #[case(">7")]
    #[case("*")]
    fn display_reparses_to_equivalent_spec(#[case] input: &str) {
        let parsed = spec(input);
        assert_eq!(spec(&parsed.to_string()), parsed);
    }

    #[rstest]
    #[case("=1", "5", false)]
    #[case(">7", "5", false)]
    #[case(">1", "5", true)]
    #[case("<6", "2", true)]
    #[case(">=2", "2", true)]
    #[case(">=1.*.*", "2", true)]
    #[case(">=1.0.*", "2.1", true)]
    #[case(">=1.0.*", "2.1.10", true)]
    #[case("=1.0.*", "1.0.10", true)]
    #[case("=1.0.*", "1.0", true)]
    #[case("1.0", "1.0", true)]
    #[case("1.0", "v1.0", true)]
    #[case("1.0", "v1.1", false)]
    #[case("<1.1.1", "0.0.0", true)]
    #[case("<1.1.1", "1.1.0", false)]
    fn is_satisfied_by_returns_expected(
        #[case] spec_text: &str,
        #[case] version: &str,
        #[case] expected: bool,
    ) {
        let version = Version::parse(version).unwrap();
        assert_eq!(spec(spec_text).is_satisfied_by(&version), expected);
    }

    #[test]
    fn unversioned_spec_is_satisfied_by_anything() {
        let unversioned = VersionSpec::unversioned();
        assert!(unversioned.is_unversioned());
        assert!(unversioned.is_satisfied_by(&Version::unversioned()));
        assert!(unversioned.is_satisfied_by(&Version::parse("3.2.1").unwrap()));
    }

    #[rstest]
    #[case("=1", "=5", false, false)]
    #[case(">1", "=5", false, true)]
    #[case("<7", "=5", false, true)]
    #[case("=1", "=1", true, true)]
    #[case(">6", "<4", false, false)]
    #[case(">2", ">4", false, true)]
    #[case(">2.0", ">4.0", false, true)]
    #[case(">2.0.0", ">4.0.0", false, true)]
    fn outranks_is_containment_of_bounds(
        #[case] a: &str,
        #[case] b: &str,
        #[case] a_outranks_b: bool,
        #[case] b_outranks_a: bool,
    ) {
        assert_eq!(spec(a).outranks(&spec(b)), a_outranks_b);
        assert_eq!(spec(b).outranks(&spec(a)), b_outranks_a);
    }

    #[test]
    fn any_versioned_spec_outranks_unversioned() {
        assert!(spec("=1.2").outranks(&VersionSpec::unversioned()));
        assert!(!VersionSpec::unversioned().outranks(&spec("=1.2")));
    }
}
