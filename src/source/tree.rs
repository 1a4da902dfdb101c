//! [`PackageOracle`] over Go sources on disk.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use super::constraint::BuildContext;
use super::scan::parse_header;
use super::{Inclusion, LoadError, PackageInfo, PackageOracle};
use crate::workspace::Workspace;

/// Directory names never descended into when listing subpackages.
const SKIP_DIRS: &[&str] = &["testdata", "vendor"];

/// Reads package imports from the workspace source tree.
#[derive(Clone, Debug)]
pub struct SourceTree {
    workspace: Workspace,
    context: BuildContext,
}

impl SourceTree {
    /// An oracle over `workspace`, evaluating strict loads against `context`.
    #[must_use]
    pub const fn new(workspace: Workspace, context: BuildContext) -> Self {
        Self { workspace, context }
    }

    /// The workspace being read.
    #[must_use]
    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn load_dir(&self, dir: &Path, inclusion: Inclusion) -> Result<PackageInfo, LoadError> {
        let mut files =
            go_files(dir).map_err(|e| LoadError::Invalid(format!("{}: {e}", dir.display())))?;
        files.sort();

        let mut info = PackageInfo::default();
        if files.is_empty() {
            return Ok(info);
        }

        let mut included = 0usize;
        for name in &files {
            if inclusion == Inclusion::Strict && !self.context.matches_file_name(name) {
                continue;
            }
            let path = dir.join(name);
            let src = fs::read_to_string(&path)
                .map_err(|e| LoadError::Invalid(format!("{}: {e}", path.display())))?;
            let header = parse_header(&src);
            if inclusion == Inclusion::Strict && !self.context.matches_header(&header) {
                continue;
            }
            let Some(package) = header.package else {
                return Err(LoadError::Invalid(format!(
                    "{}: missing package clause",
                    path.display()
                )));
            };
            included += 1;

            let is_test = name.ends_with("_test.go");
            let target = if is_test && package.ends_with("_test") {
                &mut info.xtest_imports
            } else if is_test {
                &mut info.test_imports
            } else {
                if info.name.is_empty() {
                    info.name.clone_from(&package);
                } else if info.name != package {
                    return Err(LoadError::Invalid(format!(
                        "{}: found packages {} and {}",
                        dir.display(),
                        info.name,
                        package
                    )));
                }
                &mut info.imports
            };
            target.extend(header.imports);
        }

        if included == 0 {
            return Err(LoadError::Excluded);
        }
        Ok(info)
    }
}

impl PackageOracle for SourceTree {
    #[instrument(skip(self), level = "debug")]
    fn load(&self, import_path: &str, inclusion: Inclusion) -> Result<PackageInfo, LoadError> {
        let dir = self
            .workspace
            .find_dir(import_path)
            .ok_or(LoadError::NotFound)?;
        let info = self.load_dir(&dir, inclusion)?;
        debug!(
            package = %info.name,
            imports = info.imports.len(),
            "loaded package"
        );
        Ok(info)
    }

    fn subpackages(&self, import_path: &str) -> Vec<String> {
        let Some(dir) = self.workspace.find_dir(import_path) else {
            return Vec::new();
        };
        let mut found = BTreeSet::new();
        collect_packages(&dir, import_path.trim_end_matches('/'), &mut found);
        found.into_iter().collect()
    }
}

fn go_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.ends_with(".go") && !name.starts_with('_') && !name.starts_with('.') {
            files.push(name);
        }
    }
    Ok(files)
}

fn collect_packages(dir: &Path, import_path: &str, found: &mut BTreeSet<String>) {
    if go_files(dir).is_ok_and(|files| !files.is_empty()) {
        found.insert(import_path.to_owned());
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('_') || name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
            continue;
        }
        collect_packages(&entry.path(), &format!("{import_path}/{name}"), found);
    }
}
