//! Declarative dependency rewriting
//!
//! A rule fires when every one of its match expressions matches the named
//! field of the flattened dependency. Match expressions are anchored at both
//! ends, so `github\.com` matches only that exact host. When a rule fires, its
//! replacement templates are all rendered against the same flattened view and
//! the results are written back in one step.
//!
//! Rules run once, in order. Later rules see the effect of earlier ones, which
//! is how a bare import turns into a url and then into a typed dependency.

pub mod error;
pub mod rules;
mod template;

use std::collections::BTreeMap;

use handlebars::Handlebars;
use indexmap::IndexMap;
use regex::Regex;
use tracing::trace;

use crate::dependency::{Dependency, field};

pub use error::RewriteError;
pub use rules::{archive_rules, basic_rules, git_rules, standard_rules, std_rules};

pub struct RewriteRule {
    matches: IndexMap<String, Regex>,
    replacements: Vec<String>,
    templates: Handlebars<'static>,
}

impl RewriteRule {
    /// Build a rule from `field -> regex` matches and `field -> template`
    /// replacements.
    pub fn new<M, R, K, V>(matches: M, replacements: R) -> Result<Self, RewriteError>
    where
        M: IntoIterator<Item = (K, V)>,
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut rule = Self {
            matches: IndexMap::new(),
            replacements: Vec::new(),
            templates: template::engine(),
        };

        for (name, pattern) in matches {
            let name = known_field(name.as_ref())?;
            let regex = Regex::new(&format!("^(?:{})$", pattern.as_ref())).map_err(|source| {
                RewriteError::InvalidPattern {
                    field: name.clone(),
                    source,
                }
            })?;
            rule.matches.insert(name, regex);
        }

        for (name, replacement) in replacements {
            let name = known_field(name.as_ref())?;
            rule.templates
                .register_template_string(&name, replacement.as_ref())
                .map_err(|source| RewriteError::InvalidTemplate {
                    field: name.clone(),
                    source: Box::new(source),
                })?;
            if !rule.replacements.contains(&name) {
                rule.replacements.push(name);
            }
        }

        Ok(rule)
    }

    /// Shorthand for a rule that assigns a `type` to untyped dependencies
    /// whose `field` matches `pattern`.
    pub fn type_resolver(field: &str, pattern: &str, source_type: &str) -> Result<Self, RewriteError> {
        Self::new([("type", ""), (field, pattern)], [("type", source_type)])
    }

    fn matches_values(&self, values: &BTreeMap<String, String>) -> bool {
        self.matches.iter().all(|(name, regex)| {
            values
                .get(name)
                .is_some_and(|value| regex.is_match(value))
        })
    }

    /// Apply the rule to `dep`. Returns whether the rule fired.
    pub fn apply(&self, dep: &mut Dependency) -> Result<bool, RewriteError> {
        let values = dep.flatten();
        if !self.matches_values(&values) {
            return Ok(false);
        }

        let mut updates = BTreeMap::new();
        for name in &self.replacements {
            let value = self
                .templates
                .render(name, &values)
                .map_err(|source| RewriteError::Render {
                    import: dep.import.clone(),
                    field: name.clone(),
                    source: Box::new(source),
                })?;
            updates.insert(name.clone(), value);
        }

        trace!("Rewriting '{}': {:?}", dep.import, updates);
        dep.set_values(&updates)
            .map_err(|source| RewriteError::Apply {
                import: dep.import.clone(),
                source,
            })?;
        Ok(true)
    }
}

fn known_field(name: &str) -> Result<String, RewriteError> {
    match field(name) {
        Some(accessor) => Ok(accessor.name.to_string()),
        None => Err(RewriteError::UnknownField(name.to_string())),
    }
}

/// An ordered list of rewrite rules
#[derive(Default)]
pub struct RewriteRules {
    rules: Vec<RewriteRule>,
}

impl RewriteRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    /// Append `other` after the current rules
    pub fn extend(&mut self, other: RewriteRules) {
        self.rules.extend(other.rules);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }

    /// Run every rule once, in order, stopping at the first error
    pub fn apply(&self, dep: &mut Dependency) -> Result<(), RewriteError> {
        for rule in &self.rules {
            rule.apply(dep)?;
        }
        Ok(())
    }
}

impl From<Vec<RewriteRule>> for RewriteRules {
    fn from(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }
}

impl FromIterator<RewriteRule> for RewriteRules {
    fn from_iter<I: IntoIterator<Item = RewriteRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
