//! Supported version control systems and their command templates.
//!
//! glock never links a VCS library; every operation is one invocation of the
//! tool's executable built from a small per-kind template table. Templates
//! use `{dir}`, `{repo}` and `{rev}` placeholders which are substituted per
//! argument, so paths containing spaces stay a single argument.

use std::fmt;
use std::str::FromStr;

use crate::error::VcsError;

// ---------------------------------------------------------------------------
// VcsKind
// ---------------------------------------------------------------------------

/// A version control system glock knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VcsKind {
    /// Git.
    Git,
    /// Mercurial.
    Mercurial,
    /// Bazaar.
    Bazaar,
    /// Subversion.
    Subversion,
}

impl VcsKind {
    /// All kinds, in metadata-directory probe order.
    pub const ALL: [Self; 4] = [Self::Git, Self::Mercurial, Self::Bazaar, Self::Subversion];

    /// The executable name.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Mercurial => "hg",
            Self::Bazaar => "bzr",
            Self::Subversion => "svn",
        }
    }

    /// The metadata directory that marks a repository root.
    #[must_use]
    pub const fn metadata_dir(self) -> &'static str {
        match self {
            Self::Git => ".git",
            Self::Mercurial => ".hg",
            Self::Bazaar => ".bzr",
            Self::Subversion => ".svn",
        }
    }

    /// Look up a kind by its metadata directory name (e.g. `".hg"`).
    #[must_use]
    pub fn from_metadata_dir(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.metadata_dir() == dir)
    }

    /// The command templates for this kind.
    #[must_use]
    pub const fn commands(self) -> &'static CommandTable {
        match self {
            Self::Git => &GIT,
            Self::Mercurial => &MERCURIAL,
            Self::Bazaar => &BAZAAR,
            Self::Subversion => &SUBVERSION,
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for VcsKind {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git" => Ok(Self::Git),
            "hg" | "mercurial" => Ok(Self::Mercurial),
            "bzr" | "bazaar" => Ok(Self::Bazaar),
            "svn" | "subversion" => Ok(Self::Subversion),
            other => Err(VcsError::UnknownVcs {
                name: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandTable
// ---------------------------------------------------------------------------

/// Argument templates for the four operations glock performs.
#[derive(Debug)]
pub struct CommandTable {
    /// Print the currently checked-out revision.
    pub head: &'static [&'static str],
    /// Create a new local copy of `{repo}` at `{dir}`.
    pub create: &'static [&'static str],
    /// Bring an existing local copy's history up to date.
    pub download: &'static [&'static str],
    /// Check out exactly `{rev}`.
    pub checkout: &'static [&'static str],
}

static GIT: CommandTable = CommandTable {
    head: &["rev-parse", "HEAD"],
    create: &["clone", "{repo}", "{dir}"],
    download: &["fetch", "--all", "--tags"],
    checkout: &["checkout", "-q", "{rev}"],
};

static MERCURIAL: CommandTable = CommandTable {
    head: &["id"],
    create: &["clone", "-U", "{repo}", "{dir}"],
    download: &["pull"],
    checkout: &["update", "-r", "{rev}"],
};

static BAZAAR: CommandTable = CommandTable {
    head: &["log", "-r-1", "--line"],
    create: &["branch", "{repo}", "{dir}"],
    download: &["pull", "--overwrite"],
    checkout: &["update", "-r", "{rev}"],
};

static SUBVERSION: CommandTable = CommandTable {
    head: &["info", "--show-item", "revision"],
    create: &["checkout", "{repo}", "{dir}"],
    download: &["update"],
    checkout: &["update", "-r", "{rev}"],
};

/// Values substituted into a template.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateVars<'a> {
    /// Local directory (`{dir}`).
    pub dir: &'a str,
    /// Remote repository URL (`{repo}`).
    pub repo: &'a str,
    /// Revision (`{rev}`).
    pub rev: &'a str,
}

/// Expand a template into concrete arguments.
#[must_use]
pub fn expand(template: &[&str], vars: TemplateVars<'_>) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            arg.replace("{dir}", vars.dir)
                .replace("{repo}", vars.repo)
                .replace("{rev}", vars.rev)
        })
        .collect()
}
