//! Selection of the newest tag satisfying a spec

use crate::version::number::Version;
use crate::version::spec::VersionSpec;

/// Find the newest tag that satisfies `spec`.
///
/// Tags are ranked by their parsed version, never by creation date. Tags that
/// do not parse as versions are skipped. When several tags parse to the same
/// version (e.g. "v1.0" and "1.0") the lexically greatest tag wins.
pub fn select_latest<'a>(spec: &VersionSpec, tags: &'a [String]) -> Option<(&'a str, Version)> {
    tags.iter()
        .filter_map(|tag| Version::parse(tag).ok().map(|parsed| (tag.as_str(), parsed)))
        .filter(|(_, parsed)| spec.is_satisfied_by(parsed))
        .max_by(|(tag_a, a), (tag_b, b)| a.cmp(b).then_with(|| tag_a.cmp(tag_b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(">=1.0", vec![], None)]
    #[case(">=1.0", vec!["v1.0.0", "v2.0.0", "v1.5.0"], Some("v2.0.0"))]
    #[case("=1.*", vec!["v1.0.0", "v2.0.0", "v1.5.0"], Some("v1.5.0"))]
    #[case("<2", vec!["1.9", "1.10", "2.0"], Some("1.10"))]
    #[case(">=1.0", vec!["invalid", "v1.0.0", "not-semver"], Some("v1.0.0"))]
    #[case(">=1.0", vec!["invalid", "not-semver"], None)]
    #[case(">5", vec!["v1.0.0", "v2.0.0"], None)]
    #[case("=1.0", vec!["v1.0", "1.0", "release-1.0"], Some("v1.0"))]
    fn select_latest_returns_expected(
        #[case] spec: &str,
        #[case] tags: Vec<&str>,
        #[case] expected: Option<&str>,
    ) {
        let spec = VersionSpec::parse(spec).unwrap();
        let tags: Vec<String> = tags.into_iter().map(|s| s.to_string()).collect();
        assert_eq!(
            select_latest(&spec, &tags).map(|(tag, _)| tag),
            expected
        );
    }

    #[test]
    fn select_latest_returns_parsed_version() {
        let spec = VersionSpec::parse(">=1").unwrap();
        let tags = vec!["r2015.01.24".to_string(), "r2014.12.01".to_string()];
        let (tag, version) = select_latest(&spec, &tags).unwrap();
        assert_eq!(tag, "r2015.01.24");
        assert_eq!(version, Version::new(Some(2015), Some(1), Some(24)));
    }
}
