//! In-memory [`Git`] used by the orchestrator tests.
//!
//! Each submodule has a linear remote history; the parent's recorded
//! pointers, the checked-out commits, the index, and the commit log are plain
//! maps so tests can assert on exact state.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use subsync_core::{CommitId, SubmodulePath, SubmoduleRecord};

use crate::error::GitError;
use crate::git::Git;

/// Everything a mutating operation could change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RepoState {
    recorded: BTreeMap<String, String>,
    checked_out: BTreeMap<String, String>,
    staged: Vec<String>,
    commits: Vec<(String, Vec<String>)>,
    pushes: usize,
}

#[derive(Debug, Default)]
struct State {
    repo: RepoState,
    remotes: BTreeMap<String, Vec<String>>,
    /// Index into `remotes` when the branch was reset behind its history.
    rewound: BTreeMap<String, usize>,
    failing_fetch: BTreeSet<String>,
    failing_push: bool,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeGit {
    state: RefCell<State>,
}

fn commit_id(path: &str, index: usize) -> String {
    let hash = path
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x100_0000_01b3));
    format!("{hash:016x}{index:024x}")
}

fn transport_error(command: &str) -> GitError {
    GitError::Failed {
        command: command.to_string(),
        status: Some(128),
        stderr: "fatal: unable to access remote: Could not resolve host".to_string(),
    }
}

impl State {
    fn tip(&self, path: &str) -> Option<String> {
        let history = self.remotes.get(path)?;
        match self.rewound.get(path) {
            Some(&index) => history.get(index).cloned(),
            None => history.last().cloned(),
        }
    }
}

impl FakeGit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Submodule with `history` commits, pinned and checked out at the tip.
    pub(crate) fn add_submodule(&self, path: &str, history: usize) {
        let mut state = self.state.borrow_mut();
        let commits: Vec<String> = (0..history.max(1)).map(|i| commit_id(path, i)).collect();
        let tip = commits.last().cloned().unwrap_or_default();
        state.remotes.insert(path.to_string(), commits);
        state.repo.recorded.insert(path.to_string(), tip.clone());
        state.repo.checked_out.insert(path.to_string(), tip);
    }

    /// Push `count` new commits to the submodule's tracked branch.
    pub(crate) fn advance_remote(&self, path: &str, count: usize) {
        let mut state = self.state.borrow_mut();
        state.rewound.remove(path);
        let history = state.remotes.entry(path.to_string()).or_default();
        let start = history.len();
        history.extend((start..start + count).map(|i| commit_id(path, i)));
    }

    /// Reset the tracked branch `count` commits back; the dropped commits
    /// stay known so the recorded pointer can sit ahead of the remote.
    pub(crate) fn rewind_remote(&self, path: &str, count: usize) {
        let mut state = self.state.borrow_mut();
        let len = state.remotes.get(path).map_or(0, Vec::len);
        let tip = len.saturating_sub(1).saturating_sub(count);
        state.rewound.insert(path.to_string(), tip);
    }

    pub(crate) fn fail_fetch(&self, path: &str) {
        self.state.borrow_mut().failing_fetch.insert(path.to_string());
    }

    pub(crate) fn fail_push(&self) {
        self.state.borrow_mut().failing_push = true;
    }

    pub(crate) fn uninitialize(&self, path: &str) {
        self.state.borrow_mut().repo.checked_out.remove(path);
    }

    pub(crate) fn recorded(&self, path: &str) -> Option<String> {
        self.state.borrow().repo.recorded.get(path).cloned()
    }

    pub(crate) fn remote_tip(&self, path: &str) -> Option<String> {
        self.state.borrow().tip(path)
    }

    pub(crate) fn commits(&self) -> Vec<String> {
        self.state
            .borrow()
            .repo
            .commits
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub(crate) fn last_committed_paths(&self) -> Vec<String> {
        self.state
            .borrow()
            .repo
            .commits
            .last()
            .map(|(_, paths)| paths.clone())
            .unwrap_or_default()
    }

    pub(crate) fn staged(&self) -> Vec<String> {
        self.state.borrow().repo.staged.clone()
    }

    pub(crate) fn push_count(&self) -> usize {
        self.state.borrow().repo.pushes
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn snapshot(&self) -> RepoState {
        self.state.borrow().repo.clone()
    }

    fn log(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn join(paths: &[SubmodulePath]) -> String {
    paths
        .iter()
        .map(SubmodulePath::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

impl Git for FakeGit {
    fn recorded_commit(&self, path: &SubmodulePath) -> Result<Option<CommitId>, GitError> {
        self.log(format!("recorded_commit {path}"));
        Ok(self.recorded(path.as_str()).map(CommitId::from))
    }

    fn checked_out(&self, path: &SubmodulePath) -> Result<Option<CommitId>, GitError> {
        self.log(format!("checked_out {path}"));
        let state = self.state.borrow();
        Ok(state.repo.checked_out.get(path.as_str()).cloned().map(CommitId::from))
    }

    fn describe(&self, path: &SubmodulePath) -> Result<Option<String>, GitError> {
        self.log(format!("describe {path}"));
        let state = self.state.borrow();
        Ok(state
            .repo
            .checked_out
            .get(path.as_str())
            .map(|id| format!("v1.0-g{}", &id[..7])))
    }

    fn fetch_remote_tip(&self, record: &SubmoduleRecord) -> Result<CommitId, GitError> {
        self.log(format!("fetch {}", record.path));
        let state = self.state.borrow();
        if state.failing_fetch.contains(record.path.as_str()) {
            return Err(transport_error("git fetch --quiet origin"));
        }
        state
            .tip(record.path.as_str())
            .map(CommitId::from)
            .ok_or_else(|| transport_error("git fetch --quiet origin"))
    }

    fn commits_between(
        &self,
        path: &SubmodulePath,
        from: &CommitId,
        to: &CommitId,
    ) -> Result<Option<u64>, GitError> {
        self.log(format!("rev_list_count {path}"));
        let state = self.state.borrow();
        let Some(history) = state.remotes.get(path.as_str()) else {
            return Ok(None);
        };
        let position = |id: &CommitId| history.iter().position(|c| *c == id.0);
        Ok(match (position(from), position(to)) {
            // `from..to` is empty when `to` is an ancestor of `from`.
            (Some(a), Some(b)) => Some(b.saturating_sub(a) as u64),
            _ => None,
        })
    }

    fn update_remote(&self, path: &SubmodulePath) -> Result<(), GitError> {
        self.log(format!("update_remote {path}"));
        let mut state = self.state.borrow_mut();
        if state.failing_fetch.contains(path.as_str()) {
            return Err(transport_error("git submodule update --init --recursive --remote"));
        }
        let tip = state
            .tip(path.as_str())
            .ok_or_else(|| transport_error("git submodule update --init --recursive --remote"))?;
        state.repo.checked_out.insert(path.to_string(), tip);
        Ok(())
    }

    fn changed_submodules(&self, paths: &[SubmodulePath]) -> Result<Vec<SubmodulePath>, GitError> {
        self.log(format!("changed_submodules {}", join(paths)));
        let state = self.state.borrow();
        Ok(paths
            .iter()
            .filter(|p| state.repo.checked_out.get(p.as_str()) != state.repo.recorded.get(p.as_str()))
            .cloned()
            .collect())
    }

    fn stage(&self, paths: &[SubmodulePath]) -> Result<(), GitError> {
        self.log(format!("stage {}", join(paths)));
        let mut state = self.state.borrow_mut();
        for path in paths {
            if !state.repo.staged.iter().any(|s| s == path.as_str()) {
                state.repo.staged.push(path.to_string());
            }
        }
        Ok(())
    }

    fn commit(&self, paths: &[SubmodulePath], message: &str) -> Result<Option<CommitId>, GitError> {
        self.log(format!("commit {}", join(paths)));
        let mut state = self.state.borrow_mut();
        let committed: Vec<String> = paths
            .iter()
            .map(|p| p.to_string())
            .filter(|p| state.repo.staged.contains(p))
            .collect();
        if committed.is_empty() {
            return Ok(None);
        }

        let repo = &mut state.repo;
        for path in &committed {
            if let Some(current) = repo.checked_out.get(path).cloned() {
                repo.recorded.insert(path.clone(), current);
            }
        }
        repo.staged.retain(|s| !committed.contains(s));
        repo.commits.push((message.to_string(), committed));
        Ok(Some(CommitId::from(format!("{:040x}", repo.commits.len()))))
    }

    fn push(&self, remote: &str) -> Result<(), GitError> {
        self.log(format!("push {remote}"));
        let mut state = self.state.borrow_mut();
        if state.failing_push {
            return Err(GitError::Failed {
                command: format!("git push --quiet {remote} HEAD"),
                status: Some(1),
                stderr: "remote: Permission denied".to_string(),
            });
        }
        state.repo.pushes += 1;
        Ok(())
    }
}
