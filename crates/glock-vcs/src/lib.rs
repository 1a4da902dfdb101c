//! VCS layer for glock.
//!
//! glock pins dependencies to exact revisions but never implements a VCS
//! itself: every query or mutation is one invocation of `git`, `hg`, `bzr`
//! or `svn`, built from a per-kind template table.
//!
//! # Crate layout
//!
//! - [`kind`]: [`VcsKind`] and the command-template table.
//! - [`revision`]: [`Revision`] and the "head" output normalizer.
//! - [`runner`]: the [`CommandRunner`] subprocess seam.
//! - [`driver`]: [`Driver`], a kind bound to a runner.
//! - [`error`]: [`VcsError`].

pub mod driver;
pub mod error;
pub mod kind;
pub mod revision;
pub mod runner;

pub use driver::Driver;
pub use error::VcsError;
pub use kind::VcsKind;
pub use revision::{Revision, SHORT_LEN, parse_head};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
