//! Sync orchestrator: `status`, `check`, and `update`.
//!
//! Submodules are processed one at a time in `.gitmodules` order. `update`
//! owns the parent working tree and index for its whole run, guarded by the
//! advisory [`SyncLock`].
//!
//! `update` protocol:
//!
//! 1. Resolve targets (unknown path → abort, nothing touched).
//! 2. Take the lock.
//! 3. Per target: fetch + check out the remote tip. Failures are recorded and
//!    the batch continues.
//! 4. Collect pointer drift among the targets that updated cleanly.
//! 5. Stage exactly those paths; commit when requested.
//! 6. Push only when requested and a commit was created.

use chrono::Utc;

use subsync_core::{
    config::{Config, DEFAULT_COMMIT_PREFIX, DEFAULT_REMOTE},
    gitmodules, CommitId, RepoRoot, SubmodulePath, SubmoduleRecord,
};

use crate::error::{GitError, SyncError};
use crate::git::Git;
use crate::lock::SyncLock;
use crate::message::{self, PointerChange};
use crate::report::{
    CheckEntry, CheckOutcome, CheckReport, CommitOutcome, PushOutcome, SubmoduleStatus,
    SyncReport, UpdateEntry, UpdateOutcome,
};

/// Which submodules an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncScope {
    /// Every submodule in `.gitmodules`.
    #[default]
    All,
    /// Only these paths, still processed in declaration order.
    Paths(Vec<String>),
}

impl SyncScope {
    /// `All` for an empty list.
    pub fn from_paths(paths: Vec<String>) -> Self {
        if paths.is_empty() {
            SyncScope::All
        } else {
            SyncScope::Paths(paths)
        }
    }

    fn targets(&self) -> &[String] {
        match self {
            SyncScope::All => &[],
            SyncScope::Paths(paths) => paths,
        }
    }
}

/// Caller-controlled behaviour of [`Orchestrator::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Create a commit when pointers drifted.
    pub commit: bool,
    /// Push after committing. Only honoured when `commit` is set.
    pub push: bool,
    pub remote: String,
    pub commit_prefix: String,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            commit: true,
            push: false,
            remote: DEFAULT_REMOTE.to_string(),
            commit_prefix: DEFAULT_COMMIT_PREFIX.to_string(),
        }
    }
}

impl UpdateOptions {
    pub fn from_config(config: &Config, commit: bool, push: bool) -> Self {
        Self {
            commit,
            push,
            remote: config.remote.clone(),
            commit_prefix: config.commit_prefix.clone(),
        }
    }
}

pub struct Orchestrator<G> {
    root: RepoRoot,
    records: Vec<SubmoduleRecord>,
    git: G,
}

impl<G: Git> Orchestrator<G> {
    pub fn new(root: RepoRoot, records: Vec<SubmoduleRecord>, git: G) -> Self {
        Self { root, records, git }
    }

    /// Read `.gitmodules` under `root`.
    pub fn open(root: RepoRoot, git: G) -> Result<Self, SyncError> {
        let records = gitmodules::load_at(&root.path)?;
        Ok(Self::new(root, records, git))
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    fn select(&self, scope: &SyncScope) -> Result<Vec<SubmoduleRecord>, SyncError> {
        Ok(gitmodules::select(&self.records, scope.targets())?)
    }

    // -----------------------------------------------------------------------
    // status
    // -----------------------------------------------------------------------

    /// Current reference of each submodule. Read-only; individual git
    /// failures show up as missing fields rather than errors.
    pub fn status(&self, scope: &SyncScope) -> Result<Vec<SubmoduleStatus>, SyncError> {
        let targets = self.select(scope)?;
        Ok(targets
            .iter()
            .map(|record| {
                let path = &record.path;
                SubmoduleStatus {
                    path: path.clone(),
                    checked_out: self.quiet(path, "checked_out", self.git.checked_out(path)),
                    recorded: self.quiet(path, "recorded_commit", self.git.recorded_commit(path)),
                    reference: self.quiet(path, "describe", self.git.describe(path)),
                }
            })
            .collect())
    }

    fn quiet<T>(
        &self,
        path: &SubmodulePath,
        what: &str,
        result: Result<Option<T>, GitError>,
    ) -> Option<T> {
        result.unwrap_or_else(|err| {
            tracing::debug!("{what} failed for {path}: {err}");
            None
        })
    }

    // -----------------------------------------------------------------------
    // check
    // -----------------------------------------------------------------------

    /// Fetch each target and compare its remote tip with the recorded
    /// pointer. Never stages, commits, or checks anything out in the parent.
    pub fn check(&self, scope: &SyncScope) -> Result<CheckReport, SyncError> {
        let targets = self.select(scope)?;
        let checked_at = Utc::now();

        let mut entries = Vec::with_capacity(targets.len());
        for record in &targets {
            let entry = self.check_one(record);
            if let CheckOutcome::Error { message } = &entry.outcome {
                tracing::warn!("check failed for {}: {}", record.path, message);
            }
            entries.push(entry);
        }

        Ok(CheckReport {
            checked_at,
            entries,
        })
    }

    fn check_one(&self, record: &SubmoduleRecord) -> CheckEntry {
        let path = &record.path;
        let error = |recorded: Option<CommitId>, message: String| CheckEntry {
            path: path.clone(),
            recorded,
            remote: None,
            outcome: CheckOutcome::Error { message },
        };

        // Before the first parent commit there is no recorded pointer; compare
        // against whatever is checked out instead.
        let recorded = match self.git.recorded_commit(path) {
            Ok(Some(id)) => Some(id),
            Ok(None) => self.quiet(path, "checked_out", self.git.checked_out(path)),
            Err(err) => return error(None, err.to_string()),
        };

        let remote = match self.git.fetch_remote_tip(record) {
            Ok(id) => id,
            Err(err) => return error(recorded, err.to_string()),
        };

        let outcome = match &recorded {
            Some(current) if *current == remote => CheckOutcome::UpToDate,
            Some(current) => {
                let commits = self
                    .git
                    .commits_between(path, current, &remote)
                    .unwrap_or_else(|err| {
                        tracing::debug!("commit count failed for {path}: {err}");
                        None
                    });
                match commits {
                    // Nothing in `recorded..remote`: the remote tip is an ancestor.
                    Some(0) => CheckOutcome::Ahead,
                    commits => CheckOutcome::Behind { commits },
                }
            }
            None => CheckOutcome::Behind { commits: None },
        };
        tracing::info!("checked {path}: {outcome:?}");

        CheckEntry {
            path: path.clone(),
            recorded,
            remote: Some(remote),
            outcome,
        }
    }

    // -----------------------------------------------------------------------
    // update
    // -----------------------------------------------------------------------

    /// Bring targets to their remote tips and reconcile the parent pointers.
    ///
    /// Returns `Err` only for preconditions and for failures of the
    /// parent-repository steps (diff, stage, commit). Per-submodule fetch
    /// failures and push failures are reported in the [`SyncReport`].
    pub fn update(
        &self,
        scope: &SyncScope,
        options: &UpdateOptions,
    ) -> Result<SyncReport, SyncError> {
        let targets = self.select(scope)?;
        let _lock = SyncLock::acquire(&self.root.lock_path())?;
        let started_at = Utc::now();

        // Step 3: advance each submodule, remembering the pointer it had.
        let mut attempted = Vec::with_capacity(targets.len());
        for record in &targets {
            let path = &record.path;
            let before = self.quiet(path, "recorded_commit", self.git.recorded_commit(path));
            tracing::info!("updating {path}");
            let result = self.git.update_remote(path).map_err(|err| {
                tracing::warn!("update failed for {path}: {err}");
                err.to_string()
            });
            attempted.push((path.clone(), before, result));
        }

        // Step 4: pointer drift, only among clean updates.
        let succeeded: Vec<SubmodulePath> = attempted
            .iter()
            .filter(|(_, _, result)| result.is_ok())
            .map(|(path, _, _)| path.clone())
            .collect();
        let changed = self.git.changed_submodules(&succeeded)?;

        let mut entries = Vec::with_capacity(attempted.len());
        let mut changes = Vec::new();
        for (path, before, result) in attempted {
            let outcome = match result {
                Err(message) => UpdateOutcome::Error { message },
                Ok(()) if changed.contains(&path) => {
                    let after = self.quiet(&path, "checked_out", self.git.checked_out(&path));
                    changes.push(PointerChange {
                        path: path.clone(),
                        from: before.clone(),
                        to: after.clone(),
                    });
                    UpdateOutcome::Updated {
                        from: before,
                        to: after,
                    }
                }
                Ok(()) => UpdateOutcome::UpToDate,
            };
            entries.push(UpdateEntry { path, outcome });
        }

        // Step 5: stage and commit.
        let commit = if changed.is_empty() {
            tracing::info!("no submodule pointer changes");
            CommitOutcome::NothingToDo
        } else {
            self.git.stage(&changed)?;
            if options.commit {
                let message = message::render(&options.commit_prefix, &changes);
                match self.git.commit(&changed, &message)? {
                    Some(id) => {
                        tracing::info!("created commit {}", id.short());
                        CommitOutcome::Committed { id, message }
                    }
                    None => CommitOutcome::NothingToDo,
                }
            } else {
                tracing::info!("staged {} pointer change(s) without committing", changed.len());
                CommitOutcome::Staged { paths: changed }
            }
        };

        // Step 6: push.
        let push = match (&commit, options.commit && options.push) {
            (CommitOutcome::Committed { .. }, true) => match self.git.push(&options.remote) {
                Ok(()) => {
                    tracing::info!("pushed to {}", options.remote);
                    PushOutcome::Pushed {
                        remote: options.remote.clone(),
                    }
                }
                Err(err) => {
                    tracing::warn!("push to {} failed: {}", options.remote, err);
                    PushOutcome::Failed {
                        remote: options.remote.clone(),
                        message: err.to_string(),
                    }
                }
            },
            (CommitOutcome::Committed { .. }, false) => PushOutcome::Skipped,
            _ => PushOutcome::NotNeeded,
        };

        Ok(SyncReport {
            started_at,
            entries,
            commit,
            push,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
