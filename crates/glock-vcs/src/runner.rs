//! Subprocess execution seam.
//!
//! [`CommandRunner`] is the only place glock spawns external programs. The
//! process-backed [`ProcessRunner`] is used in production; tests substitute
//! doubles that record invocations or simulate failures.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::VcsError;

/// Captured result of a successful command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout and stderr concatenated, the way a terminal would show them.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Runs external programs on behalf of glock.
///
/// Implementations must be shareable across the sync workers.
pub trait CommandRunner: Send + Sync {
    /// Run `program args...` in `dir`.
    ///
    /// # Errors
    /// [`VcsError::Spawn`] if the program could not be started,
    /// [`VcsError::CommandFailed`] if it exited unsuccessfully.
    fn run(&self, dir: &Path, program: &str, args: &[String]) -> Result<CommandOutput, VcsError>;
}

/// Runs commands as real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, dir: &Path, program: &str, args: &[String]) -> Result<CommandOutput, VcsError> {
        debug!(program, ?args, dir = %dir.display(), "running");
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .env("PWD", dir)
            .output()
            .map_err(|source| VcsError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.status.success() {
            return Ok(CommandOutput { stdout, stderr });
        }

        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_owned()
        } else {
            stderr.trim().to_owned()
        };
        Err(VcsError::CommandFailed {
            command: format!("{program} {}", args.join(" ")),
            dir: dir.to_owned(),
            stderr: detail,
            exit_code: output.status.code(),
        })
    }
}
