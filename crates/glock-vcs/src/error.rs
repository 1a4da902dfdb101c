//! Error types for VCS operations.
//!
//! [`VcsError`] is the single error type returned by the command table, the
//! revision normalizer, and every [`CommandRunner`](crate::CommandRunner)
//! implementation. Callers match on variants instead of parsing messages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by VCS operations.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The output of a "head" command could not be turned into a revision.
    ///
    /// The full raw output is kept so the user can see what the tool printed.
    #[error("invalid revision in VCS output: {raw:?}")]
    InvalidRevision {
        /// Unmodified command output.
        raw: String,
    },

    /// An external VCS command exited unsuccessfully.
    #[error("`{command}` failed in {}{}: {stderr}", dir.display(), exit_suffix(*exit_code))]
    CommandFailed {
        /// The command line that was run (program + arguments).
        command: String,
        /// Working directory of the invocation.
        dir: PathBuf,
        /// Captured stderr (and stdout when stderr was empty), trimmed.
        stderr: String,
        /// Process exit code, if the process was not killed by a signal.
        exit_code: Option<i32>,
    },

    /// The VCS executable could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        /// The program that was invoked.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O error outside of process spawning (e.g. creating a parent dir).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A VCS name or metadata directory did not match any known kind.
    #[error("unknown version control system `{name}`")]
    UnknownVcs {
        /// The name that failed to match.
        name: String,
    },
}

fn exit_suffix(code: Option<i32>) -> String {
    code.map_or_else(String::new, |c| format!(" (exit code {c})"))
}
