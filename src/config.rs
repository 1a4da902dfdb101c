//! Project configuration (`glock.toml`).
//!
//! Lives next to the `GLOCKFILE`. Every field is optional; a missing file
//! means all defaults.
//!
//! ```toml
//! [sync]
//! max_concurrent = 25
//!
//! [closure]
//! fetch_attempts = 3
//! tags = ["integration"]
//!
//! [toolchain]
//! program = "go"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::closure::DEFAULT_FETCH_ATTEMPTS;
use crate::error::{GlockError, Result};

/// File name of the project configuration.
pub const CONFIG_FILE_NAME: &str = "glock.toml";

/// Default admission limit for concurrent dependency reconciliation.
pub const DEFAULT_MAX_CONCURRENT: usize = 25;

/// Top-level project configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlockConfig {
    /// Sync scheduler settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Closure calculation settings.
    #[serde(default)]
    pub closure: ClosureConfig,

    /// Command build settings.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `[sync]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Maximum simultaneous reconciliations. Too many exhausts file
    /// descriptors on hosts with low limits.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

const fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

/// `[closure]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClosureConfig {
    /// Closure passes (fetching missing packages between them) before
    /// missing packages are fatal.
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Extra build tags satisfied in the strict configuration.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            fetch_attempts: default_fetch_attempts(),
            tags: Vec::new(),
        }
    }
}

const fn default_fetch_attempts() -> u32 {
    DEFAULT_FETCH_ATTEMPTS
}

/// `[toolchain]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Program invoked as `<program> install -v <cmd>`.
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

fn default_program() -> String {
    "go".to_owned()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl GlockConfig {
    /// Load `glock.toml` from `project_dir`.
    ///
    /// A missing file yields defaults.
    ///
    /// # Errors
    /// [`GlockError::Config`] on unreadable files, invalid TOML, unknown
    /// fields, or out-of-range values.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::path_in(project_dir);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(GlockError::Config {
                    path,
                    detail: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|detail| GlockError::Config { path, detail })
    }

    /// Parse configuration text.
    ///
    /// # Errors
    /// A message with the offending line when one is known.
    pub fn parse(toml_str: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let message = e.message().to_owned();
            match e.span() {
                Some(span) => {
                    let line = toml_str[..span.start]
                        .chars()
                        .filter(|&c| c == '\n')
                        .count()
                        + 1;
                    format!("line {line}: {message}")
                }
                None => message,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.sync.max_concurrent == 0 {
            return Err("sync.max_concurrent must be at least 1".to_owned());
        }
        if self.closure.fetch_attempts == 0 {
            return Err("closure.fetch_attempts must be at least 1".to_owned());
        }
        if self.toolchain.program.trim().is_empty() {
            return Err("toolchain.program must not be empty".to_owned());
        }
        Ok(())
    }

    /// Where the configuration for a project directory lives.
    #[must_use]
    pub fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }
}
