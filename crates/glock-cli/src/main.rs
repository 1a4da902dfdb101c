use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod telemetry;

/// Pin a project's dependencies to exact VCS revisions
///
/// glock records the revision of every repository a project imports in a
/// GLOCKFILE, and brings a workspace back to those revisions on demand.
///
/// QUICK START:
///
///   glock save github.com/you/project      # write GLOCKFILE
///   glock sync github.com/you/project      # check out every pin
///   glock install github.com/you/project   # auto-apply after git pull
///
/// WORKSPACE:
///
///   Repositories live under <root>/src/<import-path> for each root in
///   GOPATH. New downloads go to the first root.
#[derive(Parser)]
#[command(name = "glock")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'glock <command> --help' for more information on a specific command.")]
struct Cli {
    /// Workspace roots, separated like PATH
    #[arg(long, env = "GOPATH", global = true, hide_env_values = true)]
    gopath: Option<OsString>,

    /// Colorize status output (default)
    #[arg(long, global = true, overrides_with = "no_color")]
    color: bool,

    /// Print status output without color
    #[arg(long, global = true, overrides_with = "color")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a GLOCKFILE for a package's dependencies
    ///
    /// Computes every external package the project (including its
    /// subpackages, tests and declared commands) imports, and pins the
    /// repository of each at its current revision.
    Save {
        /// Print to stdout instead of writing the file
        #[arg(short = 'n')]
        dry_run: bool,

        /// Import path of the project
        import_path: String,
    },

    /// Bring the workspace to the revisions in a GLOCKFILE
    ///
    /// Downloads missing repositories, checks out every pin that differs,
    /// then rebuilds the declared commands.
    Sync {
        /// Read the GLOCKFILE from stdin
        #[arg(short = 'n')]
        stdin: bool,

        /// Maximum repositories reconciled at once
        #[arg(short = 'j', long = "jobs", value_parser = clap::value_parser!(u16).range(1..))]
        jobs: Option<u16>,

        /// Import path of the project
        #[arg(required_unless_present = "stdin")]
        import_path: Option<String>,
    },

    /// Apply a GLOCKFILE diff (read from stdin) to the workspace
    ///
    /// Expects the output of `git log -p` limited to the GLOCKFILE, oldest
    /// commit first.
    Apply {
        /// Import path of the project, for its glock.toml
        import_path: Option<String>,
    },

    /// Add a command-line tool to a project's GLOCKFILE
    ///
    /// The tool must be a main package. It is built immediately, rebuilt by
    /// `glock sync`, and its dependencies are pinned by `glock save`.
    Cmd {
        /// Print to stdout instead of writing the file
        #[arg(short = 'n')]
        dry_run: bool,

        /// Import path of the project
        project: String,

        /// Import path of the command
        cmd: String,
    },

    /// Install VCS hooks that apply GLOCKFILE changes after each pull
    Install {
        /// Import path of the project
        import_path: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init();

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_requires_path_unless_stdin() {
        assert!(Cli::try_parse_from(["glock", "sync"]).is_err());
        assert!(Cli::try_parse_from(["glock", "sync", "-n"]).is_ok());
        assert!(Cli::try_parse_from(["glock", "sync", "-j", "0", "x.com/y"]).is_err());
    }

    #[test]
    fn no_color_overrides() {
        let cli = Cli::try_parse_from(["glock", "--no-color", "save", "x.com/y"]).unwrap();
        assert!(cli.no_color);
        assert!(!cli.color);
    }
}
