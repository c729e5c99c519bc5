//! Round-based dependency resolution
//!
//! Each round takes the dependencies queued by the previous one and:
//! 1. deduplicates them by import, keeping the declaration that outranks
//! 2. drops the ones an already finalized library satisfies
//! 3. rewrites, validates and fetches the rest concurrently
//! 4. finalizes the fetched libraries and queues what they declare
//!
//! Resolution ends when a round queues nothing new. Any error ends it early
//! and releases every library fetched so far.

pub mod error;
pub mod finalized;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use indexmap::map::Entry;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::dependency::Dependency;
use crate::library::{InstallError, Library};
use crate::source::{FetchError, Registry};

pub use error::{Conflict, ResolveError};
pub use finalized::Finalized;

/// Collapse dependencies sharing an import into the one that outranks the rest.
///
/// The surviving declaration keeps the position of the first one seen. Equal
/// specs keep the first declaration.
pub fn deduplicate(deps: Vec<Dependency>) -> Result<Vec<Dependency>, ResolveError> {
    let mut unique: IndexMap<String, Dependency> = IndexMap::with_capacity(deps.len());

    for dep in deps {
        match unique.entry(dep.import.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(dep);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.outranks(&dep) {
                    continue;
                }
                if !dep.outranks(existing) {
                    return Err(ResolveError::Reconciliation {
                        import: dep.import,
                        conflict: Conflict::Specs(existing.version_spec, dep.version_spec),
                    });
                }
                *existing = dep;
            }
        }
    }

    Ok(unique.into_values().collect())
}

/// Drop dependencies already satisfied by a finalized library.
///
/// A dependency whose import is finalized at a version it does not accept
/// is an error.
pub fn filter_finalized(
    deps: Vec<Dependency>,
    finalized: &Finalized,
) -> Result<Vec<Dependency>, ResolveError> {
    let mut pending = Vec::with_capacity(deps.len());

    for dep in deps {
        match finalized.get(&dep.import) {
            None => pending.push(dep),
            Some(library) if dep.is_satisfied_by(&library.version) => {
                debug!("Already resolved: {} {}", dep.import, library.version);
            }
            Some(library) => {
                return Err(ResolveError::Reconciliation {
                    import: dep.import,
                    conflict: Conflict::Resolved {
                        version: library.version,
                        spec: dep.version_spec,
                    },
                });
            }
        }
    }

    Ok(pending)
}

/// Resolves dependency sets against a [`Registry`]
pub struct Resolver {
    registry: Arc<Registry>,
    fetch_timeout: Duration,
}

impl Resolver {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Time allowed for a single fetch before it counts as failed
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve `deps` and everything they transitively declare.
    ///
    /// On error no library survives: all fetched artifacts are released.
    pub async fn resolve_dependencies(&self, deps: Vec<Dependency>) -> Result<Finalized, ResolveError> {
        let mut finalized = Finalized::new();
        match self.resolve_into(deps, &mut finalized).await {
            Ok(()) => Ok(finalized),
            Err(e) => {
                finalized.destroy();
                Err(e)
            }
        }
    }

    async fn resolve_into(&self, mut queue: Vec<Dependency>, finalized: &mut Finalized) -> Result<(), ResolveError> {
        let mut round = 0;

        while !queue.is_empty() {
            round += 1;
            debug!("Round {}: {} dependencies queued", round, queue.len());

            let unique = deduplicate(queue)?;
            let pending = filter_finalized(unique, finalized)?;
            debug!("Round {}: resolving {} dependencies", round, pending.len());

            let libraries = self.resolve_round(pending).await?;

            queue = Vec::new();
            let mut libraries = libraries.into_iter();
            while let Some(library) = libraries.next() {
                if let Err(e) = Self::commit(library, finalized, &mut queue) {
                    for mut rest in libraries {
                        let _ = rest.destroy();
                    }
                    return Err(e);
                }
            }
        }

        debug!("Resolved {} libraries in {} rounds", finalized.len(), round);
        Ok(())
    }

    /// Fold a fetched library into the finalized set and queue its dependencies
    fn commit(
        mut library: Library,
        finalized: &mut Finalized,
        queue: &mut Vec<Dependency>,
    ) -> Result<(), ResolveError> {
        // Different declarations can canonicalize to the same import
        if let Some(existing) = finalized.get(library.import()) {
            let satisfied = library.dependency.is_satisfied_by(&existing.version);
            let conflict = Conflict::Resolved {
                version: existing.version,
                spec: library.dependency.version_spec,
            };
            let _ = library.destroy();
            if satisfied {
                debug!("Already resolved: {}", library.import());
                return Ok(());
            }
            return Err(ResolveError::Reconciliation {
                import: library.import().to_string(),
                conflict,
            });
        }

        let declared = library.dependencies.clone();
        finalized.insert(library)?;
        queue.extend(declared);
        Ok(())
    }

    /// Fetch every pending dependency concurrently and wait for all of them
    async fn resolve_round(&self, pending: Vec<Dependency>) -> Result<Vec<Library>, ResolveError> {
        let outcomes = join_all(pending.into_iter().map(|dep| self.resolve_one(dep))).await;

        let mut libraries = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(library) => libraries.push(library),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            return Ok(libraries);
        }

        for e in &errors {
            error!("{}", e);
        }
        for mut library in libraries {
            let _ = library
                .destroy()
                .inspect_err(|e| warn!("Failed to remove files of '{}': {}", library.import(), e));
        }
        Err(ResolveError::Aggregate(errors))
    }

    /// Canonicalize one dependency and fetch it from its source
    pub async fn resolve_one(&self, mut dep: Dependency) -> Result<Library, ResolveError> {
        self.registry.rules().apply(&mut dep)?;

        let source = self
            .registry
            .get(&dep.source_type)
            .ok_or_else(|| ResolveError::NoSource {
                import: dep.import.clone(),
                source_type: dep.source_type.clone(),
            })?;
        source.validate(&dep)?;

        let import = dep.import.clone();
        let library = timeout(self.fetch_timeout, source.fetch(dep))
            .await
            .map_err(|_| FetchError::TimedOut {
                import,
                timeout: self.fetch_timeout,
            })??;

        info!("Resolved: {} {}", library.import(), library.version);
        Ok(library)
    }
}

/// Install every finalized library under `root`, skipping the files its
/// source does not want installed.
///
/// Installing a library replaces its directory, so libraries are installed
/// shallowest import first and a nested import lands inside its parent.
pub fn install_libraries(root: &Path, finalized: &Finalized, registry: &Registry) -> Result<(), InstallError> {
    let mut libraries: Vec<&Library> = finalized.iter().collect();
    libraries.sort_by_key(|library| library.install_path(root).components().count());

    for library in libraries {
        let ignore = registry
            .get(library.source_type())
            .and_then(|source| source.ignore_pattern());
        info!("Installing: {}", library.import());
        library.install(root, ignore)?;
    }
    Ok(())
}
