//! Error types for glock operations.
//!
//! Defines [`GlockError`], the unified error type of the core library. Every
//! variant is self-contained: the message names the import path, command, or
//! file involved so the CLI can print it as-is.

use std::path::PathBuf;

use glock_vcs::VcsError;
use thiserror::Error;

use crate::source::Inclusion;

/// Unified error type for save / sync / apply and their building blocks.
#[derive(Debug, Error)]
pub enum GlockError {
    /// Head output of a repository could not be parsed into a revision.
    #[error("cannot determine revision of {import_path}: {source}")]
    InvalidRevision {
        /// The repository root whose head was queried.
        import_path: String,
        /// The normalizer error, carrying the raw output.
        #[source]
        source: VcsError,
    },

    /// No repository could be resolved for an import path.
    #[error("no repository found for {import_path}: {detail}")]
    RepoNotFound {
        /// The import path that was looked up.
        import_path: String,
        /// Why each resolution tier failed.
        detail: String,
    },

    /// Two adjacent diff lines for one import path had the same polarity.
    #[error(
        "malformed diff: adjacent {polarity} lines for {import_path} at line {line_no}; \
         the lock-file history is corrupted or hand-edited"
    )]
    MalformedDiff {
        /// The import path appearing twice.
        import_path: String,
        /// The shared polarity (`added` or `removed`).
        polarity: &'static str,
        /// 1-based line number of the first of the pair.
        line_no: usize,
    },

    /// An external VCS invocation failed.
    #[error("{import_path}: {source}")]
    VcsCommandFailed {
        /// The import path being operated on.
        import_path: String,
        /// The underlying VCS error.
        #[source]
        source: VcsError,
    },

    /// A package could not be loaded while computing the closure.
    #[error("cannot load package {import_path} ({inclusion}): {detail}")]
    PackageLoadError {
        /// The package that failed to load.
        import_path: String,
        /// The file-inclusion configuration in effect.
        inclusion: Inclusion,
        /// Loader diagnostic.
        detail: String,
    },

    /// Packages were still missing after the fetch-and-retry budget ran out.
    #[error("packages still missing after {attempts} attempt(s): {}", paths.join(", "))]
    UnresolvedPackages {
        /// The import paths that could not be found.
        paths: Vec<String>,
        /// How many closure passes were made.
        attempts: u32,
    },

    /// A lock file line was neither a `cmd` line nor a pin.
    #[error("GLOCKFILE line {line_no}: cannot parse {line:?}")]
    LockFileSyntax {
        /// 1-based line number.
        line_no: usize,
        /// The offending line.
        line: String,
    },

    /// Building a declared command failed.
    #[error("failed to build {import_path}:\n{output}")]
    CommandBuildFailed {
        /// The command import path.
        import_path: String,
        /// Build tool output.
        output: String,
    },

    /// A command import path does not name a `main` package.
    #[error("{import_path} is package {found}, expected main")]
    NotACommand {
        /// The command import path.
        import_path: String,
        /// The package name actually found.
        found: String,
    },

    /// Hooks are only available for some VCS kinds.
    #[error("{vcs} hook not implemented")]
    HookUnsupported {
        /// The VCS of the project repository.
        vcs: glock_vcs::VcsKind,
    },

    /// `apply` finished but some actions failed.
    #[error("{failed} change(s) could not be applied")]
    ApplyIncomplete {
        /// Number of failed actions.
        failed: usize,
    },

    /// A sync worker thread could not be started.
    #[error("failed to start sync worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// A sync worker panicked while reconciling a dependency.
    #[error("sync worker panicked while reconciling {import_path}")]
    WorkerPanicked {
        /// The dependency being reconciled.
        import_path: String,
    },

    /// No workspace roots were configured.
    #[error("no workspace roots configured; set GOPATH")]
    EmptyWorkspace,

    /// A configuration file could not be loaded or parsed.
    #[error("invalid config {}: {detail}", path.display())]
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// What was wrong.
        detail: String,
    },

    /// An I/O error, annotated with the path involved.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl GlockError {
    /// Wrap a VCS error raised while operating on `import_path`.
    ///
    /// Parse failures of head output become [`GlockError::InvalidRevision`];
    /// everything else is [`GlockError::VcsCommandFailed`].
    #[must_use]
    pub fn vcs(import_path: &str, source: VcsError) -> Self {
        match source {
            VcsError::InvalidRevision { .. } => Self::InvalidRevision {
                import_path: import_path.to_owned(),
                source,
            },
            other => Self::VcsCommandFailed {
                import_path: import_path.to_owned(),
                source: other,
            },
        }
    }

    /// Annotate an I/O error with its path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for the core library.
pub type Result<T, E = GlockError> = std::result::Result<T, E>;
