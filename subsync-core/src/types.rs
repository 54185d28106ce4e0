//! Domain types for submodule synchronization.
//!
//! Submodule paths are kept as `/`-separated strings exactly as git records
//! them in `.gitmodules` and the index; they are joined onto the repository
//! root only at the point of filesystem access.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A submodule path relative to the parent repository root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmodulePath(pub String);

impl SubmodulePath {
    /// Normalise a user-supplied path: strips a leading `./`, trailing
    /// slashes, and converts `\` separators so `cv/`, `./cv` and `cv` compare
    /// equal.
    pub fn normalized(raw: &str) -> Self {
        let mut s = raw.trim().replace('\\', "/");
        while let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        }
        while s.len() > 1 && s.ends_with('/') {
            s.pop();
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmodulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SubmodulePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SubmodulePath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A full hexadecimal commit id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub String);

impl CommitId {
    /// Abbreviated form used in commit messages and tables.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One `[submodule "<name>"]` section of `.gitmodules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmoduleRecord {
    pub name: String,
    pub path: SubmodulePath,
    pub url: String,
    /// Tracked branch. `None` means the remote's default branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl SubmoduleRecord {
    /// Ref name inside the submodule for the tracked remote branch.
    pub fn remote_ref(&self, remote: &str) -> String {
        match self.branch.as_deref() {
            Some(branch) => format!("{remote}/{branch}"),
            None => format!("{remote}/HEAD"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
