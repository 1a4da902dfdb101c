//! glock library crate: dependency-lock synchronization for GOPATH-style
//! workspaces.
//!
//! The primary interface is the `glock` binary (`crates/glock-cli`). This
//! crate holds the engine so the CLI and integration tests share it:
//!
//! - [`closure`] computes which external packages a project needs pinned,
//!   reading imports through a [`source::PackageOracle`].
//! - [`save`] turns a closure into a [`lockfile::LockFile`].
//! - [`sync`] reconciles the workspace with a lock file, concurrently.
//! - [`plan`] compiles lock-file history diffs; [`apply`] carries them out.
//! - [`backend`] is the seam to the VCS tools and the build toolchain.

pub mod apply;
pub mod backend;
pub mod closure;
pub mod command;
pub mod config;
pub mod error;
pub mod hooks;
pub mod lockfile;
pub mod plan;
pub mod repo_root;
pub mod save;
pub mod source;
pub mod status;
pub mod sync;
pub mod workspace;

pub use error::{GlockError, Result};
pub use lockfile::{CommandEntry, LockEntry, LockFile};
pub use status::StatusStyle;
pub use workspace::Workspace;
