//! Repository-root precondition.
//!
//! subsync only runs from the top of a checkout: `<dir>/.git` must exist,
//! either as the git directory itself or as a `gitdir:` pointer file (worktrees
//! and nested submodule checkouts).

use std::path::{Path, PathBuf};

use crate::error::{io_err, CoreError};

/// Name of the advisory lock file placed inside the git directory.
pub const LOCK_FILE: &str = "subsync.lock";

/// A validated repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRoot {
    /// Top of the working tree.
    pub path: PathBuf,
    /// Resolved git directory (`.git`, or the target of a `gitdir:` file).
    pub git_dir: PathBuf,
}

impl RepoRoot {
    /// Validate that `dir` is a repository root.
    pub fn discover(dir: &Path) -> Result<Self, CoreError> {
        let dot_git = dir.join(".git");
        let meta = match std::fs::metadata(&dot_git) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::NotRepositoryRoot {
                    path: dir.to_path_buf(),
                });
            }
            Err(err) => return Err(io_err(&dot_git, err)),
        };

        let git_dir = if meta.is_dir() {
            dot_git
        } else {
            resolve_gitdir_file(dir, &dot_git)?
        };

        Ok(Self {
            path: dir.to_path_buf(),
            git_dir,
        })
    }

    /// `<git_dir>/subsync.lock` — pure, no I/O.
    pub fn lock_path(&self) -> PathBuf {
        self.git_dir.join(LOCK_FILE)
    }
}

fn resolve_gitdir_file(root: &Path, file: &Path) -> Result<PathBuf, CoreError> {
    let contents = std::fs::read_to_string(file).map_err(|e| io_err(file, e))?;
    let target = contents
        .lines()
        .find_map(|line| line.trim().strip_prefix("gitdir:"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::NotRepositoryRoot {
            path: root.to_path_buf(),
        })?;

    let target = PathBuf::from(target);
    Ok(if target.is_absolute() {
        target
    } else {
        root.join(target)
    })
}
