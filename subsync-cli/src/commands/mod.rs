//! Command implementations and the shared invocation context.

pub mod check;
pub mod status;
pub mod update;

use std::path::Path;

use anyhow::{Context as _, Result};

use subsync_core::{config, Config, RepoRoot};
use subsync_sync::{Orchestrator, ShellGit};

/// Everything a command needs: the validated repository root, the loaded
/// configuration, and the output mode.
pub struct Context {
    pub root: RepoRoot,
    pub config: Config,
    pub json: bool,
}

impl Context {
    /// Validate the working directory and load configuration.
    ///
    /// Fails before touching anything when the current directory is not a
    /// repository root or the config file is unusable.
    pub fn load(config_file: Option<&Path>, json: bool) -> Result<Self> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let root = RepoRoot::discover(&cwd)?;
        let config = config::load_at(&root.path, config_file)?;
        tracing::debug!("repository root {}", root.path.display());
        Ok(Self { root, config, json })
    }

    pub fn orchestrator(&self) -> Result<Orchestrator<ShellGit>> {
        let git = ShellGit::new(&self.root.path)
            .with_config(self.config.git_config.clone())
            .with_remote(self.config.remote.clone());
        Ok(Orchestrator::open(self.root.clone(), git)?)
    }
}

/// Abbreviated commit id, or a placeholder.
pub(crate) fn short(id: Option<&subsync_core::CommitId>) -> String {
    id.map(|id| id.short().to_string())
        .unwrap_or_else(|| "-".to_string())
}
