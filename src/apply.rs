//! Apply a compiled [`Plan`] to the workspace.
//!
//! Unlike sync, a failed action does not stop the run: each failure is
//! reported and counted, and the run ends in
//! [`GlockError::ApplyIncomplete`] if anything failed.

use std::io::Write;

use tracing::{instrument, warn};

use crate::backend::{BuildOutcome, RepoBackend, Toolchain};
use crate::error::{GlockError, Result};
use crate::plan::{LibraryAction, LibraryChange, Plan};
use crate::status::StatusStyle;

/// What a fully successful apply did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Libraries added or moved to a new pin.
    pub updated: usize,
    /// Libraries reported as no longer used.
    pub removed: usize,
    /// Commands (re)compiled.
    pub commands_built: usize,
}

/// Carry out `plan`, writing one status line per action to `out`.
///
/// # Errors
/// [`GlockError::ApplyIncomplete`] if any action failed, or an I/O error
/// writing status.
#[instrument(skip_all, fields(library = plan.library.len(), commands = plan.commands.len()))]
pub fn apply(
    plan: &Plan,
    backend: &dyn RepoBackend,
    toolchain: &dyn Toolchain,
    style: StatusStyle,
    out: &mut dyn Write,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();
    let mut failed = 0usize;

    for action in &plan.library {
        let path = action.import_path.as_str();
        if action.change == LibraryChange::Remove {
            writeln!(out, "{path} is no longer in use.").map_err(stdout_err)?;
            summary.removed += 1;
            continue;
        }

        write!(out, "{path:<50.49} {:<12.12}\t", action.revision.short()).map_err(stdout_err)?;
        match move_to_pin(backend, action) {
            Ok(()) => {
                let word = if action.change == LibraryChange::Add {
                    "get OK"
                } else {
                    "checkout OK"
                };
                writeln!(out, "[{}]", style.info(word)).map_err(stdout_err)?;
                summary.updated += 1;
            }
            Err(err) => {
                warn!(path, error = %err, "apply failed");
                writeln!(out, "[{}] {err}", style.critical("error")).map_err(stdout_err)?;
                failed += 1;
            }
        }
    }

    for cmd in &plan.commands {
        let path = cmd.import_path.as_str();
        if !cmd.add {
            writeln!(out, "cmd {path} is no longer in use.").map_err(stdout_err)?;
            continue;
        }
        write!(out, "cmd {path:<59.58}\t").map_err(stdout_err)?;
        match toolchain.install(path) {
            Ok(BuildOutcome::UpToDate) => {
                writeln!(out, "[{}]", style.info("OK")).map_err(stdout_err)?;
            }
            Ok(BuildOutcome::Built) => {
                writeln!(out, "[{}]", style.warning("built")).map_err(stdout_err)?;
                summary.commands_built += 1;
            }
            Err(err) => {
                warn!(path, error = %err, "command build failed");
                writeln!(out, "[{}] {err}", style.critical("error")).map_err(stdout_err)?;
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(GlockError::ApplyIncomplete { failed });
    }
    Ok(summary)
}

/// Download the repository (creating it if new), then check out the pin.
fn move_to_pin(backend: &dyn RepoBackend, action: &LibraryAction) -> Result<()> {
    backend.fetch(&action.import_path)?;
    let repo = backend.resolve(&action.import_path)?;
    backend.checkout(&repo, &action.revision)
}

fn stdout_err(err: std::io::Error) -> GlockError {
    GlockError::io("<stdout>", err)
}
