//! `install`: VCS hooks that run `glock apply` after a pull.

use std::path::PathBuf;

use glock_vcs::VcsKind;
use tracing::debug;

use crate::error::{GlockError, Result};
use crate::repo_root::RepoRoot;

/// Hook body: feed the lock-file changes a pull brought in to `glock apply`.
pub const GIT_HOOK: &str = r#"#!/bin/bash
set -e

if [[ $GIT_REFLOG_ACTION != pull* ]]; then
        exit 0
fi

LOG=$(git log -U0 --oneline -p HEAD@{1}..HEAD GLOCKFILE)
[ -z "$LOG" ] && echo "glock: no changes to apply" && exit 0
echo "glock: applying updates..."
glock apply <<< "$LOG"
"#;

/// `post-merge` covers `git pull`; `post-checkout` covers `git pull --rebase`.
const GIT_HOOK_NAMES: &[&str] = &["post-merge", "post-checkout"];

/// Install the hooks into `repo`, returning the files written.
///
/// # Errors
/// [`GlockError::HookUnsupported`] for non-git repositories, or I/O errors.
pub fn install_hooks(repo: &RepoRoot) -> Result<Vec<PathBuf>> {
    if repo.vcs != VcsKind::Git {
        return Err(GlockError::HookUnsupported { vcs: repo.vcs });
    }

    let dir = repo.local_path.join(".git").join("hooks");
    std::fs::create_dir_all(&dir).map_err(|e| GlockError::io(&dir, e))?;

    let mut written = Vec::with_capacity(GIT_HOOK_NAMES.len());
    for name in GIT_HOOK_NAMES {
        let path = dir.join(name);
        std::fs::write(&path, GIT_HOOK).map_err(|e| GlockError::io(&path, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            std::fs::set_permissions(&path, perms).map_err(|e| GlockError::io(&path, e))?;
        }
        debug!(path = %path.display(), "hook installed");
        written.push(path);
    }
    Ok(written)
}
