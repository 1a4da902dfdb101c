//! Repository backend trait and common types.
//!
//! Defines the interface that sync, save and apply drive: locating a
//! dependency's repository, downloading it, and reading or moving its
//! checked-out revision. [`LiveBackend`] implements it with real VCS
//! subprocesses; tests substitute in-memory fakes.
//!
//! # Key Invariants
//!
//! - **Per-root isolation**: every method touches only the directory of the
//!   repository it was given, so calls for different roots may run
//!   concurrently without coordination.
//! - **Fetch before checkout**: callers never check out a revision without a
//!   fetch having run (or the head already matching) in the same operation.

mod live;

pub use live::{GoToolchain, LiveBackend};

use glock_vcs::Revision;

use crate::error::Result;
use crate::repo_root::RepoRoot;

/// The VCS operations sync, save and apply need.
///
/// Implementations must be shareable across sync workers.
#[allow(clippy::missing_errors_doc)]
pub trait RepoBackend: Send + Sync {
    /// Locate the local repository containing `import_path`.
    ///
    /// A repository that has never been downloaded is
    /// [`GlockError::RepoNotFound`](crate::error::GlockError::RepoNotFound).
    fn resolve(&self, import_path: &str) -> Result<RepoRoot>;

    /// Bring the repository containing `import_path` up to date with its
    /// remote, creating the local copy if it does not exist yet.
    ///
    /// Returns the tool's output, for diagnostics.
    fn fetch(&self, import_path: &str) -> Result<String>;

    /// The revision currently checked out in `repo`.
    fn head(&self, repo: &RepoRoot) -> Result<Revision>;

    /// Check out exactly `rev` in `repo`.
    fn checkout(&self, repo: &RepoRoot, rev: &Revision) -> Result<()>;
}

/// Whether building a command changed anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The installed binary was already current.
    UpToDate,
    /// Something was (re)compiled.
    Built,
}

/// Builds and installs declared commands.
pub trait Toolchain: Send + Sync {
    /// Build and install the `main` package at `import_path`.
    ///
    /// # Errors
    /// [`GlockError::CommandBuildFailed`](crate::error::GlockError::CommandBuildFailed)
    /// carrying the tool output.
    fn install(&self, import_path: &str) -> Result<BuildOutcome>;
}
