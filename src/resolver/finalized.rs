//! The set of libraries a resolution has settled on

use indexmap::IndexMap;
use tracing::warn;

use crate::library::Library;
use crate::resolver::error::ResolveError;

/// Resolved libraries, indexed by import and by every alias they provide.
///
/// The set only grows; a library is never replaced once inserted.
#[derive(Debug, Default)]
pub struct Finalized {
    libraries: Vec<Library>,
    index: IndexMap<String, usize>,
}

impl Finalized {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a library by import or provided alias
    pub fn get(&self, import: &str) -> Option<&Library> {
        self.index.get(import).map(|&idx| &self.libraries[idx])
    }

    pub fn contains(&self, import: &str) -> bool {
        self.index.contains_key(import)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Libraries in the order they were resolved
    pub fn iter(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter()
    }

    /// Add a library under its import and its aliases.
    ///
    /// Fails without inserting anything when one of the names is taken.
    pub fn insert(&mut self, library: Library) -> Result<(), ResolveError> {
        let names = std::iter::once(library.import()).chain(library.provides.iter().map(String::as_str));
        for name in names {
            if let Some(owner) = self.get(name) {
                return Err(ResolveError::Collision {
                    import: name.to_string(),
                    owner: owner.import().to_string(),
                });
            }
        }

        let idx = self.libraries.len();
        self.index.insert(library.import().to_string(), idx);
        for alias in &library.provides {
            self.index.insert(alias.clone(), idx);
        }
        self.libraries.push(library);
        Ok(())
    }

    /// Release every library's artifact
    pub fn destroy(&mut self) {
        for library in &mut self.libraries {
            let _ = library
                .destroy()
                .inspect_err(|e| warn!("Failed to remove files of '{}': {}", library.import(), e));
        }
    }
}

impl IntoIterator for Finalized {
    type Item = Library;
    type IntoIter = std::vec::IntoIter<Library>;

    fn into_iter(self) -> Self::IntoIter {
        self.libraries.into_iter()
    }
}
