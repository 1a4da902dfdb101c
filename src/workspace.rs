//! Workspace layout: an ordered list of roots, each with a `src` tree.
//!
//! Repositories live at `<root>/src/<import-path>`. Lookups search the roots
//! in order; new downloads always land in the first root.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{GlockError, Result};

/// Name of the lock file inside a project directory.
pub const LOCKFILE_NAME: &str = "GLOCKFILE";

/// The set of workspace roots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    roots: Vec<PathBuf>,
}

impl Workspace {
    /// Build a workspace from explicit roots.
    ///
    /// # Errors
    /// [`GlockError::EmptyWorkspace`] if `roots` is empty.
    pub fn new(roots: Vec<PathBuf>) -> Result<Self> {
        let roots: Vec<PathBuf> = roots
            .into_iter()
            .filter(|r| !r.as_os_str().is_empty())
            .collect();
        if roots.is_empty() {
            return Err(GlockError::EmptyWorkspace);
        }
        Ok(Self { roots })
    }

    /// Build a workspace from a platform path list (e.g. the `GOPATH` value).
    ///
    /// # Errors
    /// [`GlockError::EmptyWorkspace`] if the list has no entries.
    pub fn from_path_list(list: &OsStr) -> Result<Self> {
        Self::new(std::env::split_paths(list).collect())
    }

    /// All roots, in lookup order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// `<root>/src` of the primary root, where downloads land.
    #[must_use]
    pub fn primary_src(&self) -> PathBuf {
        self.roots[0].join("src")
    }

    /// Where `import_path` lives (or would live) in the primary root.
    #[must_use]
    pub fn primary_dir(&self, import_path: &str) -> PathBuf {
        join_import_path(&self.primary_src(), import_path)
    }

    /// The first existing directory for `import_path` across all roots.
    #[must_use]
    pub fn find_dir(&self, import_path: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| join_import_path(&root.join("src"), import_path))
            .find(|dir| dir.is_dir())
    }

    /// The directory of `import_path`, falling back to the primary root.
    #[must_use]
    pub fn dir(&self, import_path: &str) -> PathBuf {
        self.find_dir(import_path)
            .unwrap_or_else(|| self.primary_dir(import_path))
    }

    /// The lock file of the project at `import_path`.
    #[must_use]
    pub fn lockfile_path(&self, import_path: &str) -> PathBuf {
        self.dir(import_path).join(LOCKFILE_NAME)
    }

    /// Map a local directory back to an import path, if it is inside a root.
    #[must_use]
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        self.roots.iter().find_map(|root| {
            let rel = dir.strip_prefix(root.join("src")).ok()?;
            let parts: Vec<&str> = rel
                .components()
                .map(|c| c.as_os_str().to_str())
                .collect::<Option<_>>()?;
            (!parts.is_empty()).then(|| parts.join("/"))
        })
    }
}

fn join_import_path(src: &Path, import_path: &str) -> PathBuf {
    import_path
        .split('/')
        .filter(|seg| !seg.is_empty())
        .fold(src.to_owned(), |dir, seg| dir.join(seg))
}

/// Standard-library heuristic: the first path segment contains no dot.
#[must_use]
pub fn is_standard_library(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or_default();
    !first.contains('.')
}

/// Whether `import_path` is `prefix` itself or nested beneath it.
#[must_use]
pub fn is_under(import_path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    import_path == prefix
        || import_path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
