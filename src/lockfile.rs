//! The `GLOCKFILE` format.
//!
//! ```text
//! cmd code.google.com/p/go.tools/cmd/godoc
//! cmd code.google.com/p/go.tools/cmd/vet
//! github.com/robfig/config 0abc1c1fc2f1e3e4a8b1ed4c2b6c5f2bd1f4d92e
//! launchpad.net/gocheck 87
//! ```
//!
//! Command lines come first (sorted, deduplicated), followed by one
//! `<import-path> <revision>` pin per repository. Revisions are stored in
//! full.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{BufRead, Write as _};
use std::path::Path;

use glock_vcs::Revision;

use crate::error::{GlockError, Result};

/// One persisted pin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockEntry {
    /// Repository root import path.
    pub import_path: String,
    /// Pinned revision, untruncated.
    pub revision: Revision,
}

/// A buildable program tracked alongside the library pins.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandEntry {
    /// Import path of the `main` package.
    pub import_path: String,
}

/// An in-memory lock file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockFile {
    /// Declared commands, in file order.
    pub commands: Vec<CommandEntry>,
    /// Pins, in file order.
    pub entries: Vec<LockEntry>,
}

impl LockFile {
    /// Parse a lock file.
    ///
    /// Blank lines are ignored.
    ///
    /// # Errors
    /// [`GlockError::LockFileSyntax`] for a line that is neither form, or an
    /// I/O error from the reader.
    pub fn parse(reader: impl BufRead) -> Result<Self> {
        let mut lock = Self::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| GlockError::io("GLOCKFILE", e))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => {}
                ["cmd", path] => lock.commands.push(CommandEntry {
                    import_path: (*path).to_owned(),
                }),
                [path, rev] => lock.entries.push(LockEntry {
                    import_path: (*path).to_owned(),
                    revision: Revision::new(*rev),
                }),
                _ => {
                    return Err(GlockError::LockFileSyntax {
                        line_no: idx + 1,
                        line,
                    });
                }
            }
        }
        Ok(lock)
    }

    /// Read and parse the lock file at `path`.
    ///
    /// # Errors
    /// I/O or syntax errors.
    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| GlockError::io(path, e))?;
        Self::parse(std::io::BufReader::new(file))
    }

    /// Read the lock file at `path`, treating a missing file as empty.
    ///
    /// # Errors
    /// I/O errors other than "not found", or syntax errors.
    pub fn read_or_default(path: &Path) -> Result<Self> {
        match std::fs::File::open(path) {
            Ok(file) => Self::parse(std::io::BufReader::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(GlockError::io(path, e)),
        }
    }

    /// Add a command, keeping the list sorted and deduplicated.
    pub fn add_command(&mut self, import_path: &str) {
        self.commands.push(CommandEntry {
            import_path: import_path.to_owned(),
        });
        self.normalize_commands();
    }

    fn normalize_commands(&mut self) {
        self.commands.sort();
        self.commands.dedup();
    }

    /// Render in canonical form: sorted commands, then sorted pins.
    #[must_use]
    pub fn render(&self) -> String {
        let mut commands = self.commands.clone();
        commands.sort();
        commands.dedup();

        let mut out = String::new();
        for cmd in &commands {
            let _ = writeln!(out, "cmd {}", cmd.import_path);
        }
        for (path, rev) in self.pins() {
            let _ = writeln!(out, "{path} {rev}");
        }
        out
    }

    /// Write the canonical form to `path` atomically.
    ///
    /// The content goes to a temporary file in the same directory which is
    /// then renamed over `path`.
    ///
    /// # Errors
    /// I/O errors creating, writing, or renaming the file.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| GlockError::io(dir, e))?;
        tmp.write_all(self.render().as_bytes())
            .map_err(|e| GlockError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| GlockError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| GlockError::io(path, e.error))?;
        Ok(())
    }

    /// Render the change from `old` to `new` as diff lines.
    ///
    /// Lines use the same `+`/`-` prefixes a unified diff of the rendered
    /// files would; a changed pin produces an adjacent `-old`/`+new` pair.
    #[must_use]
    pub fn diff(old: &Self, new: &Self) -> Vec<String> {
        let mut lines = Vec::new();

        let old_cmds: std::collections::BTreeSet<&str> =
            old.commands.iter().map(|c| c.import_path.as_str()).collect();
        let new_cmds: std::collections::BTreeSet<&str> =
            new.commands.iter().map(|c| c.import_path.as_str()).collect();
        for removed in old_cmds.difference(&new_cmds) {
            lines.push(format!("-cmd {removed}"));
        }
        for added in new_cmds.difference(&old_cmds) {
            lines.push(format!("+cmd {added}"));
        }

        let old_pins = old.pins();
        let new_pins = new.pins();
        let mut paths: Vec<&str> = old_pins.keys().chain(new_pins.keys()).copied().collect();
        paths.sort_unstable();
        paths.dedup();
        for path in paths {
            match (old_pins.get(path), new_pins.get(path)) {
                (Some(a), Some(b)) if a == b => {}
                (Some(a), Some(b)) => {
                    lines.push(format!("-{path} {a}"));
                    lines.push(format!("+{path} {b}"));
                }
                (Some(a), None) => lines.push(format!("-{path} {a}")),
                (None, Some(b)) => lines.push(format!("+{path} {b}")),
                (None, None) => {}
            }
        }
        lines
    }

    /// Pins keyed by import path.
    #[must_use]
    pub fn pins(&self) -> BTreeMap<&str, &Revision> {
        self.entries
            .iter()
            .map(|e| (e.import_path.as_str(), &e.revision))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cmd code.google.com/p/go.tools/cmd/vet
cmd code.google.com/p/go.tools/cmd/godoc

github.com/robfig/config 0abc1c1fc2f1e3e4a8b1ed4c2b6c5f2bd1f4d92e
launchpad.net/gocheck 87
";

    #[test]
    fn parse_splits_commands_and_pins() {
        let lock = LockFile::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(lock.commands.len(), 2);
        assert_eq!(lock.entries.len(), 2);
        assert_eq!(lock.entries[1].import_path, "launchpad.net/gocheck");
        assert_eq!(lock.entries[1].revision.as_str(), "87");
    }

    #[test]
    fn parse_rejects_junk() {
        let err = LockFile::parse("github.com/x/y abc extra\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GlockError::LockFileSyntax { line_no: 1, .. }));
    }

    #[test]
    fn render_sorts_and_dedups() {
        let mut lock = LockFile::parse(SAMPLE.as_bytes()).unwrap();
        lock.add_command("code.google.com/p/go.tools/cmd/vet");
        assert_eq!(
            lock.render(),
            "\
cmd code.google.com/p/go.tools/cmd/godoc
cmd code.google.com/p/go.tools/cmd/vet
github.com/robfig/config 0abc1c1fc2f1e3e4a8b1ed4c2b6c5f2bd1f4d92e
launchpad.net/gocheck 87
"
        );
    }

    #[test]
    fn write_atomic_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GLOCKFILE");
        let lock = LockFile::parse(SAMPLE.as_bytes()).unwrap();
        lock.write_atomic(&path).unwrap();
        let back = LockFile::read(&path).unwrap();
        assert_eq!(back.render(), lock.render());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LockFile::read_or_default(&dir.path().join("GLOCKFILE")).unwrap();
        assert_eq!(lock, LockFile::default());
    }

    #[test]
    fn diff_pairs_changed_pins() {
        let old = LockFile::parse("a.com/x 1\nb.com/y 2\n".as_bytes()).unwrap();
        let new = LockFile::parse("cmd c.com/z\na.com/x 3\nd.com/w 4\n".as_bytes()).unwrap();
        assert_eq!(
            LockFile::diff(&old, &new),
            vec![
                "+cmd c.com/z",
                "-a.com/x 1",
                "+a.com/x 3",
                "-b.com/y 2",
                "+d.com/w 4",
            ]
        );
        assert!(LockFile::diff(&new, &new).is_empty());
    }
}
