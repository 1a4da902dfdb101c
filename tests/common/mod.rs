//! Shared test doubles for glock integration tests.
//!
//! Nothing here spawns a process: [`FakeBackend`] keeps repository heads in
//! memory and [`FakeToolchain`] returns scripted build outcomes. Filesystem
//! fixtures use temp directories.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use glock::backend::{BuildOutcome, RepoBackend, Toolchain};
use glock::repo_root::RepoRoot;
use glock::workspace::is_under;
use glock::{GlockError, LockEntry, LockFile, Result};
use glock_vcs::{Revision, VcsError, VcsKind};
use tempfile::TempDir;

/// One observed backend call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Resolve(String),
    Fetch(String),
    Head(String),
    Checkout(String, String),
}

/// In-memory repositories keyed by root import path.
#[derive(Default)]
pub struct FakeBackend {
    /// Repositories present locally: root -> checked-out revision.
    pub local: Mutex<BTreeMap<String, String>>,
    /// Repositories a fetch can create: root -> default-branch revision.
    pub remote: BTreeMap<String, String>,
    /// Roots whose head query fails.
    pub broken: BTreeSet<String>,
    /// Per-root delay applied inside every simulated VCS command.
    pub delays: BTreeMap<String, Duration>,
    /// Delay for roots without an entry in `delays`.
    pub default_delay: Duration,
    pub calls: Mutex<Vec<Call>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(self, root: &str, rev: &str) -> Self {
        self.local
            .lock()
            .unwrap()
            .insert(root.to_owned(), rev.to_owned());
        self
    }

    pub fn with_remote(mut self, root: &str, rev: &str) -> Self {
        self.remote.insert(root.to_owned(), rev.to_owned());
        self
    }

    pub fn head_of(&self, root: &str) -> Option<String> {
        self.local.lock().unwrap().get(root).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Simulate a subprocess: count it as active for its duration.
    fn command(&self, root: &str) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let delay = self.delays.get(root).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn root_of(&self, import_path: &str, pool: &BTreeMap<String, String>) -> Option<String> {
        pool.keys()
            .filter(|root| is_under(import_path, root))
            .max_by_key(|root| root.len())
            .cloned()
    }
}

impl RepoBackend for FakeBackend {
    fn resolve(&self, import_path: &str) -> Result<RepoRoot> {
        self.record(Call::Resolve(import_path.to_owned()));
        let local = self.local.lock().unwrap();
        let Some(root) = self.root_of(import_path, &local) else {
            return Err(GlockError::RepoNotFound {
                import_path: import_path.to_owned(),
                detail: "not in fake workspace".to_owned(),
            });
        };
        Ok(RepoRoot {
            local_path: PathBuf::from("/fake/src").join(&root),
            root,
            vcs: VcsKind::Git,
            remote: None,
        })
    }

    fn fetch(&self, import_path: &str) -> Result<String> {
        self.record(Call::Fetch(import_path.to_owned()));
        let existing = {
            let local = self.local.lock().unwrap();
            self.root_of(import_path, &local)
        };
        if let Some(root) = existing {
            self.command(&root);
            return Ok(String::new());
        }
        let Some(root) = self.root_of(import_path, &self.remote) else {
            return Err(GlockError::RepoNotFound {
                import_path: import_path.to_owned(),
                detail: "no such remote".to_owned(),
            });
        };
        self.command(&root);
        let rev = self.remote[&root].clone();
        self.local.lock().unwrap().insert(root, rev);
        Ok(String::new())
    }

    fn head(&self, repo: &RepoRoot) -> Result<Revision> {
        self.record(Call::Head(repo.root.clone()));
        self.command(&repo.root);
        if self.broken.contains(&repo.root) {
            return Err(GlockError::vcs(
                &repo.root,
                VcsError::CommandFailed {
                    command: "git rev-parse HEAD".to_owned(),
                    dir: repo.local_path.clone(),
                    stderr: "fatal: not a git repository".to_owned(),
                    exit_code: Some(128),
                },
            ));
        }
        let head = self.head_of(&repo.root).unwrap_or_default();
        Ok(Revision::new(head))
    }

    fn checkout(&self, repo: &RepoRoot, rev: &Revision) -> Result<()> {
        self.record(Call::Checkout(repo.root.clone(), rev.as_str().to_owned()));
        self.command(&repo.root);
        self.local
            .lock()
            .unwrap()
            .insert(repo.root.clone(), rev.as_str().to_owned());
        Ok(())
    }
}

/// Scripted build results, keyed by command import path.
#[derive(Default)]
pub struct FakeToolchain {
    pub built: BTreeSet<String>,
    pub failing: BTreeSet<String>,
    pub installs: Mutex<Vec<String>>,
}

impl Toolchain for FakeToolchain {
    fn install(&self, import_path: &str) -> Result<BuildOutcome> {
        self.installs.lock().unwrap().push(import_path.to_owned());
        if self.failing.contains(import_path) {
            return Err(GlockError::CommandBuildFailed {
                import_path: import_path.to_owned(),
                output: "undefined: main".to_owned(),
            });
        }
        if self.built.contains(import_path) {
            Ok(BuildOutcome::Built)
        } else {
            Ok(BuildOutcome::UpToDate)
        }
    }
}

/// A lock file from `(import path, revision)` pairs and command paths.
pub fn lock(entries: &[(&str, &str)], commands: &[&str]) -> LockFile {
    let mut lock = LockFile {
        commands: Vec::new(),
        entries: entries
            .iter()
            .map(|(path, rev)| LockEntry {
                import_path: (*path).to_owned(),
                revision: Revision::new(*rev),
            })
            .collect(),
    };
    for cmd in commands {
        lock.add_command(cmd);
    }
    lock
}

/// The status line sync prints for an entry, without color.
pub fn status_line(path: &str, actual: &str, verdict: &str) -> String {
    format!("{path:<50.49} {actual:<12.12}\t[{verdict}]\n")
}

/// A temp workspace root with an empty `src` tree.
pub fn temp_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    dir
}

/// Write a Go source file at `<root>/src/<rel>`.
pub fn write_go(root: &Path, rel: &str, body: &str) {
    let path = root.join("src").join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}
