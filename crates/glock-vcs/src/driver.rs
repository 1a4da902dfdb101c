//! [`Driver`]: one VCS kind bound to a command runner.

use std::path::Path;

use tracing::instrument;

use crate::error::VcsError;
use crate::kind::{TemplateVars, VcsKind, expand};
use crate::revision::{Revision, parse_head};
use crate::runner::CommandRunner;

/// Executes the templated operations of one [`VcsKind`].
#[derive(Clone, Copy)]
pub struct Driver<'a> {
    kind: VcsKind,
    runner: &'a dyn CommandRunner,
}

impl<'a> Driver<'a> {
    /// Bind `kind` to `runner`.
    #[must_use]
    pub const fn new(kind: VcsKind, runner: &'a dyn CommandRunner) -> Self {
        Self { kind, runner }
    }

    /// The kind this driver operates.
    #[must_use]
    pub const fn kind(&self) -> VcsKind {
        self.kind
    }

    /// Query the revision currently checked out in `dir`.
    ///
    /// # Errors
    /// Command failures, or [`VcsError::InvalidRevision`] if the output
    /// cannot be parsed.
    #[instrument(skip(self), fields(vcs = %self.kind))]
    pub fn head(&self, dir: &Path) -> Result<Revision, VcsError> {
        let args = expand(self.kind.commands().head, vars(dir, "", ""));
        let out = self.runner.run(dir, self.kind.program(), &args)?;
        parse_head(&out.stdout)
    }

    /// Create a fresh local copy of `repo` at `dir`.
    ///
    /// `dir` must not exist yet; its parent is created if missing. The
    /// command runs in the parent directory.
    ///
    /// # Errors
    /// Command failures or I/O errors creating the parent.
    #[instrument(skip(self), fields(vcs = %self.kind))]
    pub fn create(&self, dir: &Path, repo: &str) -> Result<String, VcsError> {
        let parent = dir.parent().unwrap_or(dir);
        std::fs::create_dir_all(parent)?;
        let args = expand(self.kind.commands().create, vars(dir, repo, ""));
        Ok(self.runner.run(parent, self.kind.program(), &args)?.combined())
    }

    /// Update the history of the existing local copy at `dir`.
    ///
    /// # Errors
    /// Command failures.
    #[instrument(skip(self), fields(vcs = %self.kind))]
    pub fn download(&self, dir: &Path) -> Result<String, VcsError> {
        let args = expand(self.kind.commands().download, vars(dir, "", ""));
        Ok(self.runner.run(dir, self.kind.program(), &args)?.combined())
    }

    /// Check out exactly `rev` in `dir`.
    ///
    /// # Errors
    /// Command failures (e.g. the revision is unknown locally).
    #[instrument(skip(self), fields(vcs = %self.kind))]
    pub fn checkout(&self, dir: &Path, rev: &Revision) -> Result<(), VcsError> {
        let args = expand(self.kind.commands().checkout, vars(dir, "", rev.as_str()));
        self.runner.run(dir, self.kind.program(), &args)?;
        Ok(())
    }
}

fn vars<'a>(dir: &'a Path, repo: &'a str, rev: &'a str) -> TemplateVars<'a> {
    TemplateVars {
        dir: dir.to_str().unwrap_or_default(),
        repo,
        rev,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::runner::CommandOutput;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
        stdout: String,
    }

    impl CommandRunner for Recorder {
        fn run(
            &self,
            dir: &Path,
            program: &str,
            args: &[String],
        ) -> Result<CommandOutput, VcsError> {
            self.calls
                .lock()
                .unwrap()
                .push((dir.to_owned(), program.to_owned(), args.to_vec()));
            Ok(CommandOutput {
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn head_parses_runner_output() {
        let runner = Recorder {
            stdout: "19114a3ee7d5+ tip\n".to_owned(),
            ..Recorder::default()
        };
        let driver = Driver::new(VcsKind::Mercurial, &runner);
        let rev = driver.head(Path::new("/ws/src/bitbucket.org/a/b")).unwrap();
        assert_eq!(rev.as_str(), "19114a3ee7d5");
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].1, "hg");
        assert_eq!(calls[0].2, vec!["id"]);
    }

    #[test]
    fn create_runs_in_parent_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("src/github.com/x/y");
        let runner = Recorder::default();
        Driver::new(VcsKind::Git, &runner)
            .create(&target, "https://github.com/x/y")
            .unwrap();
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].0, tmp.path().join("src/github.com/x"));
        assert!(calls[0].0.is_dir());
        assert_eq!(calls[0].2[0], "clone");
    }

    #[test]
    fn checkout_passes_full_revision() {
        let runner = Recorder::default();
        let rev = Revision::new("2bebebd91805dbb931317f7a4057e4e8de9d9781");
        Driver::new(VcsKind::Git, &runner)
            .checkout(Path::new("/repo"), &rev)
            .unwrap();
        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0].2,
            vec!["checkout", "-q", "2bebebd91805dbb931317f7a4057e4e8de9d9781"]
        );
    }
}
