//! Error types for subsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use subsync_core::CoreError;

/// Failure of a single `git` invocation.
#[derive(Debug, Clone, Error)]
pub enum GitError {
    /// The `git` executable could not be started.
    #[error("failed to run `{command}`: {message}")]
    Spawn { command: String, message: String },

    /// `git` ran and exited unsuccessfully.
    #[error("`{command}` failed ({}): {stderr}", exit_label(.status))]
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// `git` succeeded but printed something we could not interpret.
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// All errors that abort a sync run.
///
/// Per-submodule transport failures do not appear here; they are recorded in
/// the run's report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Precondition failure from repository metadata or config.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A git call that the whole run depends on failed.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another invocation holds the advisory lock.
    #[error("another subsync run holds the lock at {path}; remove it if no run is in progress")]
    LockHeld { path: PathBuf },
}

impl SyncError {
    /// Precondition failures abort before any submodule is touched.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SyncError::Core(_) | SyncError::LockHeld { .. })
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
