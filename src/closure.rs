//! Dependency closure: which external import paths a project needs pinned.
//!
//! The root set is the target, its subpackages, and the declared commands.
//! Imports are followed depth-first under two file-inclusion configurations
//! and the reachable sets are unioned, so a dependency that only one
//! platform or tag combination pulls in is still pinned. Only root packages
//! contribute their test imports.

use std::collections::BTreeSet;

use tracing::{debug, instrument, warn};

use crate::backend::RepoBackend;
use crate::error::{GlockError, Result};
use crate::source::{Inclusion, LoadError, PackageOracle};
use crate::workspace::{is_standard_library, is_under};

/// Default number of closure passes before missing packages are fatal.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

/// Computes dependency closures against a [`PackageOracle`].
pub struct Closure<'a> {
    oracle: &'a dyn PackageOracle,
    fetcher: Option<&'a dyn RepoBackend>,
    attempts: u32,
}

impl<'a> Closure<'a> {
    /// A calculator that never downloads; any missing package is fatal.
    #[must_use]
    pub fn new(oracle: &'a dyn PackageOracle) -> Self {
        Self {
            oracle,
            fetcher: None,
            attempts: 1,
        }
    }

    /// Fetch missing packages through `fetcher` and retry, making at most
    /// `attempts` passes in total.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: &'a dyn RepoBackend, attempts: u32) -> Self {
        self.fetcher = Some(fetcher);
        self.attempts = attempts.max(1);
        self
    }

    /// External import paths reachable from `target` and `commands`.
    ///
    /// # Errors
    /// [`GlockError::PackageLoadError`] if a root package is invalid under
    /// the strict configuration, [`GlockError::UnresolvedPackages`] if
    /// packages are still missing once the attempt budget is spent.
    #[instrument(skip(self), fields(attempts = self.attempts))]
    pub fn compute(&self, target: &str, commands: &[String]) -> Result<BTreeSet<String>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let roots = self.roots(target, commands);

            let mut missing = BTreeSet::new();
            let strict = self.traverse(&roots, Inclusion::Strict, &mut missing)?;
            if missing.is_empty() {
                let permissive = self.traverse(&roots, Inclusion::Permissive, &mut missing)?;
                let deps: BTreeSet<String> = strict
                    .into_iter()
                    .chain(permissive)
                    .filter(|path| !is_standard_library(path))
                    .filter(|path| !is_under(path, target))
                    .filter(|path| !commands.iter().any(|cmd| is_under(path, cmd)))
                    .collect();
                debug!(count = deps.len(), attempt, "closure complete");
                return Ok(deps);
            }

            let Some(fetcher) = self.fetcher.filter(|_| attempt < self.attempts) else {
                return Err(GlockError::UnresolvedPackages {
                    paths: missing.into_iter().collect(),
                    attempts: attempt,
                });
            };
            for path in &missing {
                debug!(%path, attempt, "fetching missing package");
                if let Err(err) = fetcher.fetch(path) {
                    warn!(%path, error = %err, "fetch of missing package failed");
                }
            }
        }
    }

    fn roots(&self, target: &str, commands: &[String]) -> BTreeSet<String> {
        let mut roots: BTreeSet<String> = self.oracle.subpackages(target).into_iter().collect();
        roots.insert(target.to_owned());
        roots.extend(commands.iter().cloned());
        roots
    }

    /// Every package reachable from `roots` under one configuration.
    ///
    /// Packages that are not found are added to `missing` under the strict
    /// configuration and ignored under the permissive one.
    fn traverse(
        &self,
        roots: &BTreeSet<String>,
        inclusion: Inclusion,
        missing: &mut BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let mut visited = BTreeSet::new();
        let mut reached = BTreeSet::new();
        let mut stack: Vec<String> = roots.iter().rev().cloned().collect();

        while let Some(path) = stack.pop() {
            if !visited.insert(path.clone()) {
                continue;
            }
            let is_root = roots.contains(&path);

            let info = match self.oracle.load(&path, inclusion) {
                Ok(info) => info,
                Err(LoadError::NotFound) if inclusion == Inclusion::Strict => {
                    missing.insert(path);
                    continue;
                }
                Err(LoadError::NotFound) => {
                    debug!(%path, %inclusion, "package not found");
                    continue;
                }
                Err(LoadError::Excluded) => {
                    debug!(%path, %inclusion, "all files excluded");
                    reached.insert(path);
                    continue;
                }
                Err(LoadError::Invalid(detail)) if is_root && inclusion == Inclusion::Strict => {
                    return Err(GlockError::PackageLoadError {
                        import_path: path,
                        inclusion,
                        detail,
                    });
                }
                Err(LoadError::Invalid(detail)) => {
                    warn!(%path, %inclusion, %detail, "skipping package that failed to load");
                    reached.insert(path);
                    continue;
                }
            };

            let mut edges: Vec<&String> = info.imports.iter().collect();
            if is_root {
                edges.extend(&info.test_imports);
                edges.extend(&info.xtest_imports);
            }
            for edge in edges.into_iter().rev() {
                if !is_standard_library(edge) && !visited.contains(edge) {
                    stack.push(edge.clone());
                }
            }
            reached.insert(path);
        }
        Ok(reached)
    }
}
