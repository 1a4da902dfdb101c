//! Diff-to-plan compiler.
//!
//! `apply` is fed the commit-log diff of lock-file edits (possibly several
//! commits, oldest first). Each line is classified independently, then a
//! single left-to-right pass turns the classified lines into a [`Plan`].
//!
//! Non-matching lines are kept as [`DiffLine::Empty`] placeholders: a
//! remove in one commit followed by an add in the next is two actions, not
//! an update, and only positional adjacency tells them apart.

use std::collections::HashSet;
use std::io::BufRead;
use std::sync::LazyLock;

use glock_vcs::Revision;
use regex::Regex;

use crate::error::{GlockError, Result};

const IMPORT_PATH_EXPR: &str = r"[\w.]+\.\w+/[\w/.-]+";

static LIB_LINE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(&format!(r"^[+-]({IMPORT_PATH_EXPR}) (\w+)")).unwrap()
});

static CMD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(&format!(r"^[+-]cmd ({IMPORT_PATH_EXPR})")).unwrap()
});

// ---------------------------------------------------------------------------
// DiffLine
// ---------------------------------------------------------------------------

/// Which side of the diff a line is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// `+` line.
    Added,
    /// `-` line.
    Removed,
}

impl Polarity {
    const fn of(line: &str) -> Self {
        if line.as_bytes()[0] == b'+' {
            Self::Added
        } else {
            Self::Removed
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

/// One classified line of diff input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A pin line, `±<import-path> <revision>`.
    Dependency {
        /// The pinned import path.
        import_path: String,
        /// The revision on that line.
        revision: Revision,
        /// Added or removed.
        polarity: Polarity,
    },
    /// A command line, `±cmd <import-path>`.
    Command {
        /// The command import path.
        import_path: String,
        /// Added or removed.
        polarity: Polarity,
    },
    /// Any other line.
    Empty,
}

impl DiffLine {
    /// Classify one line of diff text.
    #[must_use]
    pub fn classify(line: &str) -> Self {
        if let Some(caps) = CMD_LINE.captures(line) {
            return Self::Command {
                import_path: caps[1].to_owned(),
                polarity: Polarity::of(line),
            };
        }
        if let Some(caps) = LIB_LINE.captures(line) {
            return Self::Dependency {
                import_path: caps[1].to_owned(),
                revision: Revision::new(&caps[2]),
                polarity: Polarity::of(line),
            };
        }
        Self::Empty
    }
}

/// Classify every line of a diff stream.
///
/// # Errors
/// I/O errors from the reader.
pub fn read_diff_lines(reader: impl BufRead) -> Result<Vec<DiffLine>> {
    reader
        .lines()
        .map(|line| {
            line.map(|l| DiffLine::classify(&l))
                .map_err(|e| GlockError::io("<diff input>", e))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// What to do with a library pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryChange {
    /// A new pin.
    Add,
    /// A pin moved to another revision.
    Update,
    /// A pin was dropped.
    Remove,
}

/// A change to one library pin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryAction {
    /// Kind of change.
    pub change: LibraryChange,
    /// The pinned import path.
    pub import_path: String,
    /// Target revision (for `Remove`, the revision being dropped).
    pub revision: Revision,
}

/// A change to one declared command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandAction {
    /// `true` for add, `false` for remove.
    pub add: bool,
    /// The command import path.
    pub import_path: String,
}

/// The compiled change set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    /// Library actions, at most one per import path.
    pub library: Vec<LibraryAction>,
    /// Command actions, in input order (not deduplicated).
    pub commands: Vec<CommandAction>,
}

impl Plan {
    /// Whether the plan does nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.library.is_empty() && self.commands.is_empty()
    }
}

/// Compile classified lines into a [`Plan`].
///
/// Only the first action per library import path survives, so with
/// oldest-first input the result is the net change across all commits. An
/// adjacent pair of lines for one path is an update whose revision is the
/// added side, regardless of which line comes first.
///
/// # Errors
/// [`GlockError::MalformedDiff`] if an adjacent pair for one path has the
/// same polarity.
pub fn compile(lines: &[DiffLine]) -> Result<Plan> {
    let mut plan = Plan::default();
    let mut seen: HashSet<&str> = HashSet::new();

    let mut i = 0;
    while i < lines.len() {
        let idx = i;
        i += 1;
        match &lines[idx] {
            DiffLine::Empty => {}
            DiffLine::Command {
                import_path,
                polarity,
            } => plan.commands.push(CommandAction {
                add: *polarity == Polarity::Added,
                import_path: import_path.clone(),
            }),
            DiffLine::Dependency {
                import_path,
                revision,
                polarity,
            } => {
                if !seen.insert(import_path) {
                    continue;
                }

                if let Some(DiffLine::Dependency {
                    import_path: next_path,
                    revision: next_revision,
                    polarity: next_polarity,
                }) = lines.get(idx + 1)
                    && next_path == import_path
                {
                    if next_polarity == polarity {
                        return Err(GlockError::MalformedDiff {
                            import_path: import_path.clone(),
                            polarity: polarity.label(),
                            line_no: idx + 1,
                        });
                    }
                    let added = if *polarity == Polarity::Added {
                        revision
                    } else {
                        next_revision
                    };
                    plan.library.push(LibraryAction {
                        change: LibraryChange::Update,
                        import_path: import_path.clone(),
                        revision: added.clone(),
                    });
                    i += 1;
                    continue;
                }

                plan.library.push(LibraryAction {
                    change: match polarity {
                        Polarity::Added => LibraryChange::Add,
                        Polarity::Removed => LibraryChange::Remove,
                    },
                    import_path: import_path.clone(),
                    revision: revision.clone(),
                });
            }
        }
    }
    Ok(plan)
}

/// Classify and compile a diff stream in one step.
///
/// # Errors
/// I/O errors or [`GlockError::MalformedDiff`].
pub fn compile_stream(reader: impl BufRead) -> Result<Plan> {
    compile(&read_diff_lines(reader)?)
}
