//! Error types for subsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while reading repository metadata and config.
///
/// Every variant is a precondition failure: the caller aborts before any
/// submodule is touched.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The working directory does not contain a `.git` entry.
    #[error("{path} is not a repository root (no .git found); run from the top of the checkout")]
    NotRepositoryRoot { path: PathBuf },

    /// `.gitmodules` could not be understood.
    #[error("invalid submodule configuration at {path}:{line}: {message}")]
    InvalidGitmodules {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A requested target is not declared in `.gitmodules`.
    #[error("submodule '{path}' not found in .gitmodules")]
    SubmoduleNotFound { path: String },

    /// YAML parse error on the config file, with path context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    ConfigNotFound { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
