//! Package oracle: "given an import path, what does it import?"
//!
//! The closure calculator only talks to [`PackageOracle`]. [`SourceTree`]
//! is the filesystem implementation that reads Go sources from the
//! workspace; tests use in-memory oracles.

mod constraint;
mod scan;
mod tree;

use std::collections::BTreeSet;
use std::fmt;

pub use constraint::BuildContext;
pub use scan::{FileHeader, parse_header};
pub use tree::SourceTree;

/// File-inclusion configuration used when loading a package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Inclusion {
    /// Default build constraints for the host platform.
    Strict,
    /// Every source file, regardless of platform or tag constraints.
    Permissive,
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Permissive => f.write_str("permissive"),
        }
    }
}

/// The imports declared by one package under one [`Inclusion`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// Package clause name (`main` for commands). Empty for a directory
    /// holding no source files.
    pub name: String,
    /// Imports of the non-test files.
    pub imports: BTreeSet<String>,
    /// Imports of in-package test files.
    pub test_imports: BTreeSet<String>,
    /// Imports of external (`<name>_test`) test files.
    pub xtest_imports: BTreeSet<String>,
}

/// Why a package could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// No directory for the import path exists in the workspace.
    NotFound,
    /// Source files exist but the inclusion rules exclude all of them.
    Excluded,
    /// The package exists but could not be read or parsed.
    Invalid(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("package not found in workspace"),
            Self::Excluded => f.write_str("build constraints exclude all source files"),
            Self::Invalid(detail) => f.write_str(detail),
        }
    }
}

/// Answers import queries for the closure calculator.
pub trait PackageOracle {
    /// Load the declared imports of `import_path` under `inclusion`.
    ///
    /// # Errors
    /// A [`LoadError`] describing why the package is unavailable.
    fn load(&self, import_path: &str, inclusion: Inclusion) -> Result<PackageInfo, LoadError>;

    /// All packages at or beneath `import_path` (including itself, if it is a
    /// package).
    fn subpackages(&self, import_path: &str) -> Vec<String>;
}
