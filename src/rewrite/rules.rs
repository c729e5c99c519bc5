//! Built-in rewrite rule sets

use crate::rewrite::{RewriteRule, RewriteRules};

fn rule<const M: usize, const R: usize>(
    matches: [(&str, &str); M],
    replacements: [(&str, &str); R],
) -> RewriteRule {
    RewriteRule::new(matches, replacements).expect("built-in rewrite rule is valid")
}

fn type_rule(field: &str, pattern: &str, source_type: &str) -> RewriteRule {
    RewriteRule::type_resolver(field, pattern, source_type)
        .expect("built-in rewrite rule is valid")
}

/// Fill in a missing url from the import, or a missing import from the url.
///
/// Only imports whose first element looks like a host get a url; bare
/// imports are left for [`std_rules`].
pub fn basic_rules() -> RewriteRules {
    vec![
        rule(
            [("import", "[^/]*[.:][^/]*(?:/.*)?"), ("url", "")],
            [("url", "http://{{import}}")],
        ),
        rule([("import", ""), ("url", ".+")], [("import", "{{host}}{{path}}")]),
    ]
    .into()
}

/// Standard library imports: an untyped dependency with no url whose first
/// path element has no dot.
pub fn std_rules() -> RewriteRules {
    vec![rule(
        [("type", ""), ("url", ""), ("import", "[^./:]+(?:/.*)?")],
        [("type", "std")],
    )]
    .into()
}

pub fn archive_rules() -> RewriteRules {
    vec![
        type_rule("path", r".*\.zip", "archive"),
        type_rule("path", r".*\.(?:tar\.gz|tgz)", "archive"),
        type_rule("path", r".*\.tar", "archive"),
    ]
    .into()
}

pub fn git_rules() -> RewriteRules {
    vec![
        type_rule("scheme", "git", "git"),
        type_rule("path", r".*\.git", "git"),
        type_rule("import", r"github\.com/.*", "git"),
        type_rule("host", r"github\.com", "git"),
        // gopkg.in/pkg.vN -> github.com/go-pkg/pkg, branch vN
        rule(
            [("host", r"gopkg\.in"), ("path", "/[^/]+")],
            [
                ("branch", r#"{{replace path "^.*[.](.*)$" "$1"}}"#),
                ("path", r#"{{replace path "^/(.*)[.].*$" "/go-$1/$1"}}"#),
                ("host", "github.com"),
                ("type", "git"),
            ],
        ),
        // gopkg.in/user/pkg.vN -> github.com/user/pkg, branch vN
        rule(
            [("host", r"gopkg\.in"), ("path", "/.+/.+")],
            [
                ("branch", r#"{{replace path "^.*[.](.*)$" "$1"}}"#),
                ("path", r#"{{replace path "^(.*)[.].*$" "$1"}}"#),
                ("host", "github.com"),
                ("type", "git"),
            ],
        ),
        rule(
            [("host", r"golang\.org"), ("path", "/x/.*")],
            [
                ("host", "github.com"),
                ("path", r#"{{replace path "^/x/(.*)$" "/golang/$1"}}"#),
                (
                    "import",
                    r#"{{replace import "^golang[.]org/x/([^/]*)/(.*)$" "golang.org/x/$1"}}"#,
                ),
                ("type", "git"),
            ],
        ),
        // github repositories live at /<user>/<project>
        rule(
            [("type", "git"), ("host", r"github\.com")],
            [("path", r#"{{replace path "^/([^/]*)/([^/]*)/(.*)$" "/$1/$2"}}"#)],
        ),
    ]
    .into()
}

/// Every built-in rule set in application order
pub fn standard_rules() -> RewriteRules {
    let mut rules = basic_rules();
    rules.extend(std_rules());
    rules.extend(archive_rules());
    rules.extend(git_rules());
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{Dependency, Locator};
    use rstest::rstest;

    fn rewrite(import: &str, url: &str) -> Dependency {
        let mut dep = Dependency::new(import, url, "").unwrap();
        standard_rules().apply(&mut dep).unwrap();
        dep
    }

    #[test]
    fn gopkg_user_package_rewrites_to_github() {
        let dep = rewrite("gopkg.in/foo/bar.v3", "");

        let expected = Dependency {
            import: "gopkg.in/foo/bar.v3".to_string(),
            url: Some(Locator::parse("http://github.com/foo/bar").unwrap()),
            source_type: "git".to_string(),
            branch: "v3".to_string(),
            ..Default::default()
        };
        assert_eq!(dep, expected);
    }

    #[test]
    fn gopkg_bare_package_rewrites_to_go_prefixed_user() {
        let dep = rewrite("gopkg.in/yaml.v2", "");

        assert_eq!(
            dep.url.map(|l| l.to_string()),
            Some("http://github.com/go-yaml/yaml".to_string())
        );
        assert_eq!(dep.branch, "v2");
        assert_eq!(dep.source_type, "git");
    }

    #[test]
    fn golang_x_rewrites_to_github_mirror() {
        let dep = rewrite("golang.org/x/net/context", "");

        assert_eq!(dep.import, "golang.org/x/net");
        assert_eq!(
            dep.url.map(|l| l.to_string()),
            Some("http://github.com/golang/net".to_string())
        );
        assert_eq!(dep.source_type, "git");
    }

    #[test]
    fn github_subpackage_is_trimmed_to_repository() {
        let dep = rewrite("github.com/foo/bar/baz/qux", "");

        assert_eq!(dep.import, "github.com/foo/bar/baz/qux");
        assert_eq!(
            dep.url.map(|l| l.to_string()),
            Some("http://github.com/foo/bar".to_string())
        );
        assert_eq!(dep.source_type, "git");
    }

    #[rstest]
    #[case("", "git://localhost:9999/gitrepo", "git")]
    #[case("", "http://example.com/foo/bar.git", "git")]
    #[case("", "http://example.com/dl/foo-1.2.zip", "archive")]
    #[case("", "http://example.com/dl/foo-1.2.tar.gz", "archive")]
    #[case("", "http://example.com/dl/foo-1.2.tgz", "archive")]
    #[case("", "file:///tmp/foo-1.2.tar", "archive")]
    #[case("", "https://github.com/foo/bar/archive/v1.0.tar.gz", "archive")]
    #[case("fmt", "", "std")]
    #[case("encoding/json", "", "std")]
    #[case("example.com/foo", "", "")]
    fn standard_rules_assign_type(#[case] import: &str, #[case] url: &str, #[case] expected: &str) {
        assert_eq!(rewrite(import, url).source_type, expected);
    }

    #[test]
    fn std_import_gets_no_url() {
        let dep = rewrite("encoding/json", "");
        assert_eq!(dep.url, None);
        assert_eq!(dep.import, "encoding/json");
    }

    #[test]
    fn declared_url_on_dotless_host_is_not_std() {
        let dep = rewrite("", "http://gitserver/team/repo.git");
        assert_eq!(dep.source_type, "git");
        assert_eq!(dep.import, "gitserver/team/repo.git");
        assert_eq!(
            dep.url.map(|l| l.to_string()),
            Some("http://gitserver/team/repo.git".to_string())
        );

        let dep = rewrite("intranet/lib", "http://intranet/lib");
        assert_eq!(dep.source_type, "");
        assert_eq!(
            dep.url.map(|l| l.to_string()),
            Some("http://intranet/lib".to_string())
        );
    }

    #[test]
    fn dotless_import_with_declared_type_keeps_empty_url() {
        let mut dep = Dependency::new("gitserver/team/repo", "", "")
            .unwrap()
            .with_type("git");
        standard_rules().apply(&mut dep).unwrap();
        assert_eq!(dep.source_type, "git");
        assert_eq!(dep.url, None);
    }

    #[test]
    fn declared_type_is_kept() {
        let mut dep = Dependency::new("github.com/foo/bar", "", "")
            .unwrap()
            .with_type("archive");
        standard_rules().apply(&mut dep).unwrap();
        assert_eq!(dep.source_type, "archive");
    }

    #[test]
    fn import_is_derived_for_url_only_dependency() {
        let dep = rewrite("", "git://localhost:9999/gitrepo");
        assert_eq!(dep.import, "localhost/gitrepo");
    }
}
