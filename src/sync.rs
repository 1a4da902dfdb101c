//! Sync scheduler: make the workspace match a lock file.
//!
//! Each pinned repository is reconciled by a small state machine:
//!
//! ```text
//! NeedRepo ─► (Found | Fetched) ─► RevisionKnown ─► UpToDate
//!                                               └─► NeedsCheckout ─► Done
//! ```
//!
//! Reconciliations run on a bounded pool of worker threads. Each worker
//! buffers its status line; the coordinator prints them in lock-file order,
//! so output is deterministic whatever order workers finish in. The first
//! failure stops the run: its entry gets an `[error]` line, queued entries
//! are abandoned and in-flight workers are not waited for.
//!
//! Commands are rebuilt sequentially once every dependency is reconciled.

use std::io::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;

use tracing::{debug, info, instrument};

use crate::backend::{BuildOutcome, RepoBackend, Toolchain};
use crate::config::DEFAULT_MAX_CONCURRENT;
use crate::error::{GlockError, Result};
use crate::lockfile::{LockEntry, LockFile};
use crate::status::StatusStyle;

/// Knobs for one sync run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncOptions {
    /// Admission limit: reconciliations in flight at once.
    pub max_concurrent: usize,
    /// Status rendering.
    pub style: StatusStyle,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            style: StatusStyle::plain(),
        }
    }
}

/// What a successful sync did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Repositories already at their pin.
    pub up_to_date: usize,
    /// Repositories that had to be downloaded first.
    pub fetched: usize,
    /// Repositories moved to their pin.
    pub checked_out: usize,
    /// Commands that were (re)compiled.
    pub commands_built: usize,
}

/// How one entry ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    UpToDate,
    FetchedUpToDate,
    CheckedOut { fetched: bool },
}

#[derive(Debug)]
struct EntryReport {
    status: String,
    outcome: Outcome,
}

/// Reconcile the workspace with `lock`, writing status lines to `out`.
///
/// # Errors
/// The first resolution, VCS, or build failure, which aborts the run.
#[instrument(skip_all, fields(entries = lock.entries.len(), commands = lock.commands.len()))]
pub fn sync(
    lock: &LockFile,
    backend: &Arc<dyn RepoBackend>,
    toolchain: &dyn Toolchain,
    options: SyncOptions,
    out: &mut dyn Write,
) -> Result<SyncSummary> {
    let mut summary = sync_libraries(&lock.entries, backend, options, out)?;

    let style = options.style;
    for cmd in &lock.commands {
        write!(out, "cmd {:<59.58}\t", cmd.import_path).map_err(stdout_err)?;
        match toolchain.install(&cmd.import_path) {
            Ok(BuildOutcome::UpToDate) => {
                writeln!(out, "[{}]", style.info("OK")).map_err(stdout_err)?;
            }
            Ok(BuildOutcome::Built) => {
                summary.commands_built += 1;
                writeln!(out, "[{}]", style.warning("built")).map_err(stdout_err)?;
            }
            Err(err) => {
                writeln!(out, "[{}]", style.critical("error")).map_err(stdout_err)?;
                return Err(err);
            }
        }
    }
    info!(?summary, "sync complete");
    Ok(summary)
}

fn sync_libraries(
    entries: &[LockEntry],
    backend: &Arc<dyn RepoBackend>,
    options: SyncOptions,
    out: &mut dyn Write,
) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    if entries.is_empty() {
        return Ok(summary);
    }

    let entries: Arc<[LockEntry]> = entries.into();
    let board = Arc::new(Board::new(entries.len()));
    let next = Arc::new(AtomicUsize::new(0));
    let abort = Arc::new(AtomicBool::new(false));

    let workers = options.max_concurrent.clamp(1, entries.len());
    debug!(workers, "starting sync workers");
    for n in 0..workers {
        let entries = Arc::clone(&entries);
        let board = Arc::clone(&board);
        let next = Arc::clone(&next);
        let stop = Arc::clone(&abort);
        let backend = Arc::clone(backend);
        let style = options.style;
        thread::Builder::new()
            .name(format!("glock-sync-{n}"))
            .spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    let idx = next.fetch_add(1, Ordering::AcqRel);
                    let Some(entry) = entries.get(idx) else {
                        break;
                    };
                    let result = catch_unwind(AssertUnwindSafe(|| {
                        reconcile(backend.as_ref(), entry, style)
                    }))
                    .unwrap_or_else(|_| {
                        Err(GlockError::WorkerPanicked {
                            import_path: entry.import_path.clone(),
                        })
                    });
                    board.complete(idx, result);
                }
            })
            .map_err(|e| {
                abort.store(true, Ordering::Release);
                GlockError::WorkerSpawn(e)
            })?;
    }

    for idx in 0..entries.len() {
        let report = match board.wait(idx) {
            Ok(report) => report,
            Err(err) => {
                abort.store(true, Ordering::Release);
                let path = entries[idx].import_path.as_str();
                writeln!(out, "{path:<50.49} {:<12}\t[{}]", "", options.style.critical("error"))
                    .map_err(stdout_err)?;
                return Err(err);
            }
        };
        out.write_all(report.status.as_bytes()).map_err(stdout_err)?;
        match report.outcome {
            Outcome::UpToDate => summary.up_to_date += 1,
            Outcome::FetchedUpToDate => {
                summary.up_to_date += 1;
                summary.fetched += 1;
            }
            Outcome::CheckedOut { fetched } => {
                summary.checked_out += 1;
                summary.fetched += usize::from(fetched);
            }
        }
    }
    Ok(summary)
}

/// Drive one entry through the state machine.
#[instrument(skip_all, fields(path = %entry.import_path))]
fn reconcile(
    backend: &dyn RepoBackend,
    entry: &LockEntry,
    style: StatusStyle,
) -> Result<EntryReport> {
    let path = entry.import_path.as_str();

    let mut fetched = false;
    let repo = match backend.resolve(path) {
        Ok(repo) => repo,
        Err(GlockError::RepoNotFound { .. }) => {
            debug!("not in workspace; fetching");
            backend.fetch(path)?;
            fetched = true;
            backend.resolve(path)?
        }
        Err(err) => return Err(err),
    };

    let actual = backend.head(&repo)?;
    let got = if fetched {
        style.warning("get ")
    } else {
        String::new()
    };
    let mut status = format!("{path:<50.49} {:<12.12}\t", actual.short());

    if actual.same_pin(&entry.revision) {
        status.push_str(&format!("[{got}{}]\n", style.info("OK")));
        let outcome = if fetched {
            Outcome::FetchedUpToDate
        } else {
            Outcome::UpToDate
        };
        return Ok(EntryReport { status, outcome });
    }

    let checkout = format!("checkout {:<12.12}", entry.revision.short());
    status.push_str(&format!("[{got}{}]\n", style.warning(&checkout)));

    // The pin may be newer than anything downloaded so far.
    if !fetched {
        backend.fetch(path)?;
    }
    backend.checkout(&repo, &entry.revision)?;
    Ok(EntryReport {
        status,
        outcome: Outcome::CheckedOut { fetched },
    })
}

fn stdout_err(err: std::io::Error) -> GlockError {
    GlockError::io("<stdout>", err)
}

// ---------------------------------------------------------------------------
// Completion board
// ---------------------------------------------------------------------------

/// Write-once result slots, one per entry, awaited in order.
struct Board {
    slots: Mutex<Vec<Option<Result<EntryReport>>>>,
    filled: Condvar,
}

impl Board {
    fn new(len: usize) -> Self {
        Self {
            slots: Mutex::new((0..len).map(|_| None).collect()),
            filled: Condvar::new(),
        }
    }

    fn complete(&self, idx: usize, result: Result<EntryReport>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots[idx] = Some(result);
        drop(slots);
        self.filled.notify_all();
    }

    fn wait(&self, idx: usize) -> Result<EntryReport> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(result) = slots[idx].take() {
                return result;
            }
            slots = self
                .filled
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
