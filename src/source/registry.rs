//! Lookup of fetch sources by dependency type

use std::collections::HashMap;
use std::sync::Arc;

use crate::rewrite::{RewriteRules, standard_rules};
use crate::source::{ArchiveSource, FetchSource, GitSource, StdSource};

/// Everything the resolver needs to canonicalize and dispatch dependencies:
/// the rewrite rules and the fetch sources keyed by `type`.
#[derive(Default)]
pub struct Registry {
    sources: HashMap<String, Arc<dyn FetchSource>>,
    rules: RewriteRules,
}

impl Registry {
    pub fn new(rules: RewriteRules) -> Self {
        Self {
            sources: HashMap::new(),
            rules,
        }
    }

    /// Registry with the built-in rules and the git, archive and std sources
    pub fn standard() -> Self {
        let mut registry = Self::new(standard_rules());
        registry.register(Arc::new(GitSource::default()));
        registry.register(Arc::new(ArchiveSource::default()));
        registry.register(Arc::new(StdSource));
        registry
    }

    /// Registers a source under its own type, returning the one it replaces
    pub fn register(&mut self, source: Arc<dyn FetchSource>) -> Option<Arc<dyn FetchSource>> {
        self.sources.insert(source.source_type().to_string(), source)
    }

    pub fn get(&self, source_type: &str) -> Option<Arc<dyn FetchSource>> {
        self.sources.get(source_type).cloned()
    }

    pub fn rules(&self) -> &RewriteRules {
        &self.rules
    }

    /// Appends rules after the ones already registered
    pub fn add_rules(&mut self, rules: RewriteRules) {
        self.rules.extend(rules);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockFetchSource;

    fn mock_source(source_type: &str) -> MockFetchSource {
        let mut source = MockFetchSource::new();
        source
            .expect_source_type()
            .return_const(source_type.to_string());
        source
    }

    #[test]
    fn register_keys_source_by_type() {
        let mut registry = Registry::default();

        assert!(registry.register(Arc::new(mock_source("git"))).is_none());

        assert!(registry.get("git").is_some());
        assert!(registry.get("archive").is_none());
    }

    #[test]
    fn register_replaces_source_of_same_type() {
        let mut registry = Registry::default();
        registry.register(Arc::new(mock_source("git")));

        assert!(registry.register(Arc::new(mock_source("git"))).is_some());
    }

    #[test]
    fn standard_registry_has_builtin_sources() {
        let registry = Registry::standard();

        for source_type in ["git", "archive", "std"] {
            let source = registry.get(source_type).unwrap();
            assert_eq!(source.source_type(), source_type);
        }
        assert!(!registry.rules().is_empty());
    }

    #[test]
    fn add_rules_appends() {
        let mut registry = Registry::standard();
        let before = registry.rules().len();

        registry.add_rules(crate::rewrite::basic_rules());

        assert_eq!(registry.rules().len(), before + 2);
    }
}
