//! `save`: compute the closure of a project and pin every repository in it.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::backend::RepoBackend;
use crate::closure::Closure;
use crate::error::{GlockError, Result};
use crate::lockfile::{LockEntry, LockFile};
use crate::repo_root::RepoRoot;
use crate::source::PackageOracle;
use crate::workspace::is_under;

/// Build a fresh lock file for `target`.
///
/// Command lines of `previous` are kept and their dependencies pinned too.
/// Packages missing from the workspace are fetched through `backend`, with
/// at most `fetch_attempts` closure passes.
///
/// # Errors
/// Closure failures, unresolvable repositories, or head queries that fail.
#[instrument(skip(oracle, backend, previous))]
pub fn save(
    target: &str,
    oracle: &dyn PackageOracle,
    backend: &dyn RepoBackend,
    previous: &LockFile,
    fetch_attempts: u32,
) -> Result<LockFile> {
    let commands: Vec<String> = previous
        .commands
        .iter()
        .map(|c| c.import_path.clone())
        .collect();
    let deps = Closure::new(oracle)
        .with_fetcher(backend, fetch_attempts)
        .compute(target, &commands)?;

    let mut roots: BTreeMap<String, RepoRoot> = BTreeMap::new();
    for dep in &deps {
        if roots.keys().any(|root| is_under(dep, root)) {
            continue;
        }
        let repo = backend.resolve(dep)?;
        if is_under(target, &repo.root) {
            debug!(%dep, root = %repo.root, "dependency lives in the target's repository");
            continue;
        }
        roots.entry(repo.root.clone()).or_insert(repo);
    }

    let mut entries = Vec::with_capacity(roots.len());
    for (root, repo) in roots {
        let revision = backend.head(&repo)?;
        debug!(%root, %revision, "pinned");
        entries.push(LockEntry {
            import_path: root,
            revision,
        });
    }

    let lock = LockFile {
        commands: previous.commands.clone(),
        entries,
    };
    let changes = LockFile::diff(previous, &lock);
    for line in &changes {
        debug!(change = %line);
    }
    info!(pins = lock.entries.len(), changes = changes.len(), "lock file computed");
    Ok(lock)
}

/// Write `lock` to `path` atomically, or print it to `out` when `dry_run`.
///
/// # Errors
/// I/O failures.
pub fn persist(lock: &LockFile, path: &Path, dry_run: bool, out: &mut dyn Write) -> Result<()> {
    if dry_run {
        return out
            .write_all(lock.render().as_bytes())
            .map_err(|e| GlockError::io("<stdout>", e));
    }
    lock.write_atomic(path)
}
