//! Advisory single-writer lock for mutating runs.
//!
//! The lock is a file created with create-new semantics inside the git
//! directory and removed when the guard drops. A crashed run leaves the file
//! behind; the error message tells the user how to clear it.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Held for the duration of an `update` run.
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
}

impl SyncLock {
    /// Take the lock at `path`, failing with [`SyncError::LockHeld`] if
    /// another run already holds it.
    pub fn acquire(path: &Path) -> Result<Self, SyncError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(SyncError::LockHeld {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(io_err(path, err)),
        };

        // Owner pid helps a human decide whether the lock is stale.
        if let Err(err) = writeln!(file, "{}", std::process::id()) {
            let _ = std::fs::remove_file(path);
            return Err(io_err(path, err));
        }

        tracing::debug!("acquired lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!("failed to remove lock {}: {}", self.path.display(), err);
        }
    }
}
