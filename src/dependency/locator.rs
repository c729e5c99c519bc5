//! Source locations whose parts can be rewritten independently

use std::fmt;

use url::Url;

/// A parsed source url.
///
/// Unlike [`Url`], a locator may be partial (a host with no scheme, a bare
/// path) because rewrite rules build one up a field at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Locator {
    pub scheme: String,
    pub username: String,
    pub host: String,
    pub port: String,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Locator {
    pub fn parse(text: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(text.trim())?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            username: url.username().to_string(),
            host: url.host_str().unwrap_or_default().to_string(),
            port: url.port().map(|p| p.to_string()).unwrap_or_default(),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
        })
    }

    /// Last path segment, e.g. the archive file name
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.host.is_empty() || (!self.scheme.is_empty() && self.path.starts_with('/')) {
            f.write_str("//")?;
            if !self.username.is_empty() {
                write!(f, "{}@", self.username)?;
            }
            f.write_str(&self.host)?;
            if !self.port.is_empty() {
                write!(f, ":{}", self.port)?;
            }
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_splits_url_parts() {
        let locator = Locator::parse("git://git@localhost:9999/gitrepo?x=1#frag").unwrap();
        assert_eq!(
            locator,
            Locator {
                scheme: "git".to_string(),
                username: "git".to_string(),
                host: "localhost".to_string(),
                port: "9999".to_string(),
                path: "/gitrepo".to_string(),
                query: Some("x=1".to_string()),
                fragment: Some("frag".to_string()),
            }
        );
    }

    #[test]
    fn parse_rejects_url_without_scheme() {
        assert!(Locator::parse("github.com/foo/bar").is_err());
    }

    #[rstest]
    #[case("http://github.com/foo/bar")]
    #[case("git://localhost:9999/gitrepo")]
    #[case("ssh://git@github.com/foo/bar.git")]
    #[case("file:///tmp/archive-1.0.tar.gz")]
    #[case("https://example.com/dl/pkg.zip?token=abc")]
    fn display_renders_parsed_url(#[case] input: &str) {
        assert_eq!(Locator::parse(input).unwrap().to_string(), input);
    }

    #[test]
    fn display_renders_partial_locator() {
        let locator = Locator {
            host: "github.com".to_string(),
            path: "/foo/bar".to_string(),
            ..Default::default()
        };
        assert_eq!(locator.to_string(), "//github.com/foo/bar");
    }

    #[rstest]
    #[case("http://example.com/dl/foo-1.2.tar.gz", "foo-1.2.tar.gz")]
    #[case("http://example.com", "")]
    fn file_name_returns_last_segment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Locator::parse(input).unwrap().file_name(), expected);
    }
}
