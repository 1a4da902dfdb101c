//! Subprocess-backed [`RepoBackend`] and [`Toolchain`].

use std::path::PathBuf;
use std::sync::Arc;

use glock_vcs::{CommandRunner, Driver, Revision, VcsError};
use tracing::{debug, instrument};

use super::{BuildOutcome, RepoBackend, Toolchain};
use crate::error::{GlockError, Result};
use crate::repo_root::{RepoRoot, Resolver, remote_for};
use crate::workspace::Workspace;

/// Runs the VCS tools against repositories in a [`Workspace`].
#[derive(Clone)]
pub struct LiveBackend {
    workspace: Workspace,
    runner: Arc<dyn CommandRunner>,
}

impl LiveBackend {
    /// A backend over `workspace`, spawning commands through `runner`.
    #[must_use]
    pub fn new(workspace: Workspace, runner: Arc<dyn CommandRunner>) -> Self {
        Self { workspace, runner }
    }

    /// The workspace operated on.
    #[must_use]
    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn driver(&self, repo: &RepoRoot) -> Driver<'_> {
        Driver::new(repo.vcs, self.runner.as_ref())
    }
}

impl std::fmt::Debug for LiveBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveBackend")
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

impl RepoBackend for LiveBackend {
    fn resolve(&self, import_path: &str) -> Result<RepoRoot> {
        Resolver::new(&self.workspace).resolve(import_path)
    }

    #[instrument(skip(self))]
    fn fetch(&self, import_path: &str) -> Result<String> {
        if let Ok(repo) = self.resolve(import_path) {
            debug!(root = %repo.root, "updating existing repository");
            return self
                .driver(&repo)
                .download(&repo.local_path)
                .map_err(|e| GlockError::vcs(&repo.root, e));
        }

        let Some(remote) = remote_for(import_path) else {
            return Err(GlockError::RepoNotFound {
                import_path: import_path.to_owned(),
                detail: "not downloaded and no known hosting convention to fetch it from"
                    .to_owned(),
            });
        };
        let dir = self.workspace.primary_dir(&remote.root);
        debug!(root = %remote.root, url = %remote.url, dir = %dir.display(), "creating repository");
        Driver::new(remote.vcs, self.runner.as_ref())
            .create(&dir, &remote.url)
            .map_err(|e| GlockError::vcs(&remote.root, e))
    }

    fn head(&self, repo: &RepoRoot) -> Result<Revision> {
        self.driver(repo)
            .head(&repo.local_path)
            .map_err(|e| GlockError::vcs(&repo.root, e))
    }

    fn checkout(&self, repo: &RepoRoot, rev: &Revision) -> Result<()> {
        self.driver(repo)
            .checkout(&repo.local_path, rev)
            .map_err(|e| GlockError::vcs(&repo.root, e))
    }
}

/// Builds commands with `<program> install -v <import-path>`.
#[derive(Clone)]
pub struct GoToolchain {
    program: String,
    dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl GoToolchain {
    /// A toolchain invoking `program` from the primary source directory of
    /// `workspace`.
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        workspace: &Workspace,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            program: program.into(),
            dir: workspace.primary_src(),
            runner,
        }
    }
}

impl Toolchain for GoToolchain {
    #[instrument(skip(self), fields(program = %self.program))]
    fn install(&self, import_path: &str) -> Result<BuildOutcome> {
        let args = vec!["install".to_owned(), "-v".to_owned(), import_path.to_owned()];
        match self.runner.run(&self.dir, &self.program, &args) {
            Ok(out) if out.combined().trim().is_empty() => Ok(BuildOutcome::UpToDate),
            Ok(_) => Ok(BuildOutcome::Built),
            Err(VcsError::CommandFailed { stderr, .. }) => Err(GlockError::CommandBuildFailed {
                import_path: import_path.to_owned(),
                output: stderr,
            }),
            Err(other) => Err(GlockError::vcs(import_path, other)),
        }
    }
}
