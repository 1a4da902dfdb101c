//! `cmd`: record a command-line tool the project depends on.

use tracing::instrument;

use crate::backend::{BuildOutcome, Toolchain};
use crate::error::{GlockError, Result};
use crate::lockfile::LockFile;
use crate::source::{Inclusion, PackageOracle};

/// Verify `cmd` is a `main` package, build it, and add it to `lock`.
///
/// # Errors
/// [`GlockError::PackageLoadError`] if the package cannot be loaded,
/// [`GlockError::NotACommand`] if it is a library, or the build failure.
#[instrument(skip(oracle, toolchain, lock))]
pub fn add_command(
    cmd: &str,
    oracle: &dyn PackageOracle,
    toolchain: &dyn Toolchain,
    lock: &mut LockFile,
) -> Result<BuildOutcome> {
    let info = oracle
        .load(cmd, Inclusion::Strict)
        .map_err(|e| GlockError::PackageLoadError {
            import_path: cmd.to_owned(),
            inclusion: Inclusion::Strict,
            detail: e.to_string(),
        })?;
    if info.name != "main" {
        return Err(GlockError::NotACommand {
            import_path: cmd.to_owned(),
            found: info.name,
        });
    }

    let outcome = toolchain.install(cmd)?;
    lock.add_command(cmd);
    Ok(outcome)
}
