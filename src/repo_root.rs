//! Repository-root resolution.
//!
//! Two tiers:
//!
//! 1. **Hosting convention**: well-known hosts (`github.com/<user>/<repo>`,
//!    `launchpad.net/<project>`, ...) and explicit `.git`/`.hg`/... path
//!    segments determine the root and VCS kind from the import path alone.
//! 2. **Directory walk**: for repositories whose import path does not follow
//!    a hosting layout, walk upward from the package directory looking for a
//!    VCS metadata directory; the first match is the root.
//!
//! Results are never cached: the workspace changes under us during sync.

use std::path::PathBuf;

use glock_vcs::VcsKind;

use crate::error::{GlockError, Result};
use crate::workspace::Workspace;

/// The repository physically containing one or more packages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoRoot {
    /// Import-path prefix of every package in the repository.
    pub root: String,
    /// Which VCS manages it.
    pub vcs: VcsKind,
    /// Local checkout directory.
    pub local_path: PathBuf,
    /// Remote URL, when the hosting convention provides one.
    pub remote: Option<String>,
}

/// Where a repository can be downloaded from, per hosting convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteRepo {
    /// Import-path prefix of the repository.
    pub root: String,
    /// Which VCS serves it.
    pub vcs: VcsKind,
    /// Clone URL.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Tier 1: hosting conventions
// ---------------------------------------------------------------------------

/// Infer root, VCS and URL from well-known hosting layouts.
///
/// Returns `None` for import paths that follow no known convention.
#[must_use]
pub fn remote_for(import_path: &str) -> Option<RemoteRepo> {
    let segs: Vec<&str> = import_path.split('/').filter(|s| !s.is_empty()).collect();
    let host = *segs.first()?;

    let take = |n: usize, vcs: VcsKind, url: String| {
        (segs.len() >= n).then(|| RemoteRepo {
            root: segs[..n].join("/"),
            vcs,
            url,
        })
    };
    let https = |n: usize| format!("https://{}", segs[..n.min(segs.len())].join("/"));

    match host {
        "github.com" | "bitbucket.org" | "gitlab.com" => take(3, VcsKind::Git, https(3)),
        "golang.org" if segs.get(1) == Some(&"x") => take(
            3,
            VcsKind::Git,
            format!("https://go.googlesource.com/{}", segs.get(2)?),
        ),
        "gopkg.in" => {
            let n = if segs.get(1).is_some_and(|s| is_gopkg_versioned(s)) {
                2
            } else {
                3
            };
            take(n, VcsKind::Git, https(n))
        }
        "launchpad.net" => take(2, VcsKind::Bazaar, https(2)),
        "code.google.com" if segs.get(1) == Some(&"p") => take(3, VcsKind::Mercurial, https(3)),
        _ => vcs_suffix(&segs),
    }
}

fn is_gopkg_versioned(seg: &str) -> bool {
    seg.rsplit_once(".v").is_some_and(|(name, v)| {
        !name.is_empty() && !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit())
    })
}

/// `example.org/repo.git/pkg` ⇒ root `example.org/repo.git`, git.
fn vcs_suffix(segs: &[&str]) -> Option<RemoteRepo> {
    if !segs.first()?.contains('.') {
        return None;
    }
    segs.iter().enumerate().skip(1).find_map(|(i, seg)| {
        let (stem, ext) = seg.rsplit_once('.')?;
        let vcs = VcsKind::from_metadata_dir(&format!(".{ext}"))?;
        let mut repo: Vec<&str> = segs[..i].to_vec();
        repo.push(stem);
        Some(RemoteRepo {
            root: segs[..=i].join("/"),
            vcs,
            url: format!("https://{}", repo.join("/")),
        })
    })
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves import paths to [`RepoRoot`]s within one workspace.
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    workspace: &'a Workspace,
}

impl<'a> Resolver<'a> {
    /// A resolver over `workspace`.
    #[must_use]
    pub const fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Resolve the repository containing `import_path`.
    ///
    /// The repository must exist locally; a dependency that was never
    /// downloaded is `RepoNotFound` (sync reacts by fetching it).
    ///
    /// # Errors
    /// [`GlockError::RepoNotFound`] when neither tier finds a local repo.
    pub fn resolve(&self, import_path: &str) -> Result<RepoRoot> {
        if let Some(remote) = remote_for(import_path) {
            let Some(local_path) = self.workspace.find_dir(&remote.root) else {
                return Err(GlockError::RepoNotFound {
                    import_path: import_path.to_owned(),
                    detail: format!("{} is not downloaded", remote.root),
                });
            };
            return Ok(RepoRoot {
                root: remote.root,
                vcs: remote.vcs,
                local_path,
                remote: Some(remote.url),
            });
        }

        if self.workspace.find_dir(import_path).is_none() {
            return Err(GlockError::RepoNotFound {
                import_path: import_path.to_owned(),
                detail: "package directory does not exist".to_owned(),
            });
        }
        self.walk(import_path).ok_or_else(|| GlockError::RepoNotFound {
            import_path: import_path.to_owned(),
            detail: "no VCS metadata directory found in any parent".to_owned(),
        })
    }

    /// Tier 2: test each ancestor for `.git`, `.hg`, `.bzr`, `.svn`.
    ///
    /// Only called once the package directory itself is known to exist.
    fn walk(&self, import_path: &str) -> Option<RepoRoot> {
        let mut prefix = import_path.trim_matches('/');
        loop {
            if let Some(dir) = self.workspace.find_dir(prefix) {
                for vcs in VcsKind::ALL {
                    if dir.join(vcs.metadata_dir()).exists() {
                        return Some(RepoRoot {
                            root: prefix.to_owned(),
                            vcs,
                            local_path: dir,
                            remote: remote_for(prefix).map(|r| r.url),
                        });
                    }
                }
            }
            prefix = &prefix[..prefix.rfind('/')?];
        }
    }
}
