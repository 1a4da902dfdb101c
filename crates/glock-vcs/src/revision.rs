//! Revision identifiers and the "head" output normalizer.
//!
//! Each VCS prints its current revision differently:
//!
//! | tool | output                                   | revision       |
//! |------|------------------------------------------|----------------|
//! | git  | `2bebebd91805dbb931317f7a4057e4e8de9d9781` | the full hash  |
//! | hg   | `19114a3ee7d5 tip` / `19114a3ee7d5+ tip`    | `19114a3ee7d5` |
//! | bzr  | `50: Dimiter Naydenov 2014-02-12 ...`       | `50`           |
//!
//! Mercurial may also print `*** failed to import extension ...` lines on
//! the same stream before the payload; those are discarded.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::VcsError;

/// Number of leading characters used when displaying or comparing revisions.
pub const SHORT_LEN: usize = 12;

/// Prefix of the diagnostic lines some tools emit before the real payload.
const DIAGNOSTIC_PREFIX: &str = "*** ";

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[ :+]+").unwrap()
});

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\w+$").unwrap()
});

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// An opaque, VCS-specific revision token, stored untruncated.
///
/// Equality on `Revision` is exact. Pin comparisons during sync go through
/// [`Revision::same_pin`], which compares only the first [`SHORT_LEN`]
/// characters of each side.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Revision(String);

impl Revision {
    /// Wrap a revision string without validation.
    ///
    /// Lock files and diffs are trusted to contain well-formed tokens; use
    /// [`parse_head`] for raw tool output.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_owned())
    }

    /// The full revision string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The display prefix (at most [`SHORT_LEN`] characters).
    #[must_use]
    pub fn short(&self) -> &str {
        truncate(&self.0)
    }

    /// Whether two revisions identify the same pin.
    ///
    /// Both sides are truncated to [`SHORT_LEN`] characters before comparing,
    /// so a full hash matches its own 12-character abbreviation.
    #[must_use]
    pub fn same_pin(&self, other: &Self) -> bool {
        self.short() == other.short()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}

fn truncate(rev: &str) -> &str {
    rev.char_indices()
        .nth(SHORT_LEN)
        .map_or(rev, |(idx, _)| &rev[..idx])
}

// ---------------------------------------------------------------------------
// parse_head
// ---------------------------------------------------------------------------

/// Turn raw "head" command output into a [`Revision`].
///
/// # Errors
/// Returns [`VcsError::InvalidRevision`] (carrying the raw output) when no
/// alphanumeric token can be extracted.
pub fn parse_head(raw: &str) -> Result<Revision, VcsError> {
    let mut payload = raw.trim();
    if payload.starts_with(DIAGNOSTIC_PREFIX)
        && let Some(idx) = payload.rfind('\n')
    {
        payload = payload[idx + 1..].trim();
    }

    let candidate = SEPARATOR.split(payload).next().unwrap_or_default();
    if !TOKEN.is_match(candidate) {
        return Err(VcsError::InvalidRevision {
            raw: raw.to_owned(),
        });
    }
    Ok(Revision(candidate.to_owned()))
}
