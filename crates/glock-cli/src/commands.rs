//! Subcommand handlers: wire the CLI surface to the glock engine.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use glock::backend::{GoToolchain, LiveBackend, RepoBackend};
use glock::config::GlockConfig;
use glock::source::{BuildContext, SourceTree};
use glock::sync::SyncOptions;
use glock::{GlockError, LockFile, StatusStyle, Workspace, apply, command, hooks, plan, save, sync};
use glock_vcs::{CommandRunner, ProcessRunner};
use tracing::debug;

use crate::{Cli, Commands};

/// Everything a handler needs, built once from the global flags.
struct Env {
    workspace: Workspace,
    runner: Arc<dyn CommandRunner>,
    backend: Arc<dyn RepoBackend>,
    style: StatusStyle,
}

impl Env {
    fn new(cli: &Cli) -> Result<Self> {
        let gopath = cli.gopath.clone().ok_or(GlockError::EmptyWorkspace)?;
        let workspace = Workspace::from_path_list(&gopath)?;
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
        let backend: Arc<dyn RepoBackend> =
            Arc::new(LiveBackend::new(workspace.clone(), Arc::clone(&runner)));
        debug!(roots = ?workspace.roots(), "workspace");
        Ok(Self {
            workspace,
            runner,
            backend,
            style: StatusStyle::new(cli.color || !cli.no_color),
        })
    }

    /// The project's `glock.toml`, or defaults when no project is named.
    fn config(&self, project: Option<&str>) -> Result<GlockConfig> {
        match project {
            Some(path) => Ok(GlockConfig::load(&self.workspace.dir(path))?),
            None => Ok(GlockConfig::default()),
        }
    }

    fn oracle(&self, config: &GlockConfig) -> SourceTree {
        SourceTree::new(
            self.workspace.clone(),
            BuildContext::host(config.closure.tags.clone()),
        )
    }

    fn toolchain(&self, config: &GlockConfig) -> GoToolchain {
        GoToolchain::new(
            config.toolchain.program.clone(),
            &self.workspace,
            Arc::clone(&self.runner),
        )
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let env = Env::new(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Save {
            dry_run,
            import_path,
        } => {
            let config = env.config(Some(&import_path))?;
            let lock_path = env.workspace.lockfile_path(&import_path);
            let previous = LockFile::read_or_default(&lock_path)?;
            let lock = save::save(
                &import_path,
                &env.oracle(&config),
                env.backend.as_ref(),
                &previous,
                config.closure.fetch_attempts,
            )
            .with_context(|| format!("saving dependencies of {import_path}"))?;
            save::persist(&lock, &lock_path, dry_run, &mut out)?;
        }

        Commands::Sync {
            stdin,
            jobs,
            import_path,
        } => {
            let config = env.config(import_path.as_deref())?;
            let lock = match import_path.as_deref() {
                Some(path) if !stdin => LockFile::read(&env.workspace.lockfile_path(path))?,
                _ => LockFile::parse(io::stdin().lock())?,
            };
            let options = SyncOptions {
                max_concurrent: jobs.map_or(config.sync.max_concurrent, usize::from),
                style: env.style,
            };
            sync::sync(
                &lock,
                &env.backend,
                &env.toolchain(&config),
                options,
                &mut out,
            )?;
        }

        Commands::Apply { import_path } => {
            let config = env.config(import_path.as_deref())?;
            let plan = plan::compile_stream(io::stdin().lock())?;
            if plan.is_empty() {
                writeln!(out, "glock: nothing to apply")?;
                return Ok(());
            }
            apply::apply(
                &plan,
                env.backend.as_ref(),
                &env.toolchain(&config),
                env.style,
                &mut out,
            )?;
        }

        Commands::Cmd {
            dry_run,
            project,
            cmd,
        } => {
            let config = env.config(Some(&project))?;
            let lock_path = env.workspace.lockfile_path(&project);
            let mut lock = LockFile::read(&lock_path)?;
            command::add_command(&cmd, &env.oracle(&config), &env.toolchain(&config), &mut lock)?;
            save::persist(&lock, &lock_path, dry_run, &mut out)?;
        }

        Commands::Install { import_path } => {
            let repo = env.backend.resolve(&import_path)?;
            for path in hooks::install_hooks(&repo)? {
                writeln!(out, "Installed {}", path.display())?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
