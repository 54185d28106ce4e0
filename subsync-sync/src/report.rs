//! Per-run reports for `status`, `check`, and `update`.
//!
//! Reports are built fresh for each invocation, listed in `.gitmodules`
//! order, and serialize to the `--json` output shape.

use chrono::{DateTime, Utc};
use serde::Serialize;

use subsync_core::{CommitId, SubmodulePath};

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

/// Current state of one submodule, read without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmoduleStatus {
    pub path: SubmodulePath,
    /// Commit checked out in the submodule working tree.
    pub checked_out: Option<CommitId>,
    /// Commit recorded in the parent's `HEAD`.
    pub recorded: Option<CommitId>,
    /// `git describe` label for the checked-out commit.
    pub reference: Option<String>,
}

impl SubmoduleStatus {
    pub fn is_initialized(&self) -> bool {
        self.checked_out.is_some()
    }

    /// Checked-out commit differs from the recorded pointer.
    pub fn is_modified(&self) -> bool {
        match (&self.checked_out, &self.recorded) {
            (Some(current), Some(recorded)) => current != recorded,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckOutcome {
    UpToDate,
    /// `commits` is `None` when the history is not available locally.
    Behind { commits: Option<u64> },
    /// The recorded pointer already contains the remote tip.
    Ahead,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEntry {
    pub path: SubmodulePath,
    pub recorded: Option<CommitId>,
    pub remote: Option<CommitId>,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub checked_at: DateTime<Utc>,
    pub entries: Vec<CheckEntry>,
}

impl CheckReport {
    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.outcome, CheckOutcome::Error { .. }))
    }

    pub fn behind_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, CheckOutcome::Behind { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

/// Outcome of updating one submodule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpdateOutcome {
    UpToDate,
    Updated {
        from: Option<CommitId>,
        to: Option<CommitId>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateEntry {
    pub path: SubmodulePath,
    #[serde(flatten)]
    pub outcome: UpdateOutcome,
}

/// What happened to the parent repository after the per-submodule step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// No pointer drift; nothing was staged.
    NothingToDo,
    /// Pointer changes were staged but the caller asked not to commit.
    Staged { paths: Vec<SubmodulePath> },
    Committed { id: CommitId, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PushOutcome {
    /// No commit was created, so there was nothing to push.
    NotNeeded,
    /// A commit exists but pushing was not requested.
    Skipped,
    Pushed { remote: String },
    Failed { remote: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub entries: Vec<UpdateEntry>,
    pub commit: CommitOutcome,
    pub push: PushOutcome,
}

impl SyncReport {
    /// At least one submodule or the push failed.
    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.outcome, UpdateOutcome::Error { .. }))
            || matches!(self.push, PushOutcome::Failed { .. })
    }

    /// The parent repository was changed (staged or committed).
    pub fn changes_applied(&self) -> bool {
        !matches!(self.commit, CommitOutcome::NothingToDo)
    }

    pub fn updated(&self) -> impl Iterator<Item = &UpdateEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, UpdateOutcome::Updated { .. }))
    }
}
