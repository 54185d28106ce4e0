//! Git backend.
//!
//! [`Git`] is the seam between the orchestrator and the version-control
//! system. [`ShellGit`] drives the `git` executable so fetch/push transport
//! and credentials behave exactly as they do for the user's own git commands.
//! Every call blocks until the child process exits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use subsync_core::{CommitId, SubmodulePath, SubmoduleRecord};

use crate::error::GitError;

/// Remote name git uses inside submodule clones.
const SUBMODULE_REMOTE: &str = "origin";

/// Version-control operations the orchestrator needs.
///
/// Submodule paths are relative to the parent repository root.
pub trait Git {
    /// Commit recorded for `path` in the parent's `HEAD` tree, if any.
    fn recorded_commit(&self, path: &SubmodulePath) -> Result<Option<CommitId>, GitError>;

    /// Commit checked out in the submodule working tree, `None` when the
    /// submodule is not initialized.
    fn checked_out(&self, path: &SubmodulePath) -> Result<Option<CommitId>, GitError>;

    /// Human-readable reference (tag/branch description) for the checked-out
    /// commit.
    fn describe(&self, path: &SubmodulePath) -> Result<Option<String>, GitError>;

    /// Fetch remote refs for the submodule and return the tip of its tracked
    /// branch. Must not touch the parent's working tree or index.
    fn fetch_remote_tip(&self, record: &SubmoduleRecord) -> Result<CommitId, GitError>;

    /// Number of commits reachable from `to` but not from `from`, inside the
    /// submodule. `None` when the history is not available locally.
    fn commits_between(
        &self,
        path: &SubmodulePath,
        from: &CommitId,
        to: &CommitId,
    ) -> Result<Option<u64>, GitError>;

    /// `git submodule update --init --recursive --remote -- <path>`.
    fn update_remote(&self, path: &SubmodulePath) -> Result<(), GitError>;

    /// Subset of `paths` whose checked-out commit differs from `HEAD`.
    fn changed_submodules(&self, paths: &[SubmodulePath]) -> Result<Vec<SubmodulePath>, GitError>;

    /// Stage exactly `paths` in the parent index.
    fn stage(&self, paths: &[SubmodulePath]) -> Result<(), GitError>;

    /// Commit `paths` only. `Ok(None)` when there was nothing to commit.
    fn commit(&self, paths: &[SubmodulePath], message: &str) -> Result<Option<CommitId>, GitError>;

    /// Push the current branch to `remote`.
    fn push(&self, remote: &str) -> Result<(), GitError>;
}

// ---------------------------------------------------------------------------
// ShellGit
// ---------------------------------------------------------------------------

/// [`Git`] implementation that shells out to the `git` executable.
#[derive(Debug, Clone)]
pub struct ShellGit {
    root: PathBuf,
    config: BTreeMap<String, String>,
    /// Parent remote that relative submodule URLs are resolved against.
    remote: String,
}

/// Captured output of a successful git invocation.
struct Output {
    stdout: String,
}

impl ShellGit {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: BTreeMap::new(),
            remote: SUBMODULE_REMOTE.to_string(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Add `-c key=value` pairs to every invocation.
    pub fn with_config(mut self, config: BTreeMap<String, String>) -> Self {
        self.config.extend(config);
        self
    }

    fn submodule_dir(&self, path: &SubmodulePath) -> PathBuf {
        self.root.join(path.as_str())
    }

    fn is_initialized(&self, path: &SubmodulePath) -> bool {
        self.submodule_dir(path).join(".git").exists()
    }

    /// Run git in `dir`. Non-zero exit becomes [`GitError::Failed`].
    fn run(&self, dir: &Path, args: &[&str]) -> Result<Output, GitError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!("{} (in {})", command, dir.display());

        let mut cmd = Command::new("git");
        for (key, value) in &self.config {
            cmd.arg("-c").arg(format!("{key}={value}"));
        }
        let output = cmd
            .args(args)
            .current_dir(dir)
            // Never block on a credential prompt in CI.
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| GitError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(GitError::Failed {
                command,
                status: output.status.code(),
                stderr,
            });
        }

        Ok(Output {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn run_root(&self, args: &[&str]) -> Result<Output, GitError> {
        self.run(&self.root, args)
    }

    /// URL as git itself would use it: `./x` and `../x` are relative to the
    /// parent's remote, or to the parent checkout when it has no remote.
    fn submodule_url(&self, record: &SubmoduleRecord) -> Result<String, GitError> {
        if !is_relative_url(&record.url) {
            return Ok(record.url.clone());
        }
        let base = match self.run_root(&["remote", "get-url", &self.remote]) {
            Ok(out) if !out.stdout.trim().is_empty() => out.stdout.trim().to_string(),
            Ok(_) | Err(GitError::Failed { .. }) => self.root.to_string_lossy().into_owned(),
            Err(err) => return Err(err),
        };
        let url = resolve_relative_url(&base, &record.url);
        tracing::debug!("resolved {} against {base} to {url}", record.url);
        Ok(url)
    }

    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<CommitId, GitError> {
        let out = self.run(dir, &["rev-parse", "--verify", &format!("{rev}^{{commit}}")])?;
        parse_commit_id(&format!("git rev-parse {rev}"), &out.stdout)
    }
}

impl Git for ShellGit {
    fn recorded_commit(&self, path: &SubmodulePath) -> Result<Option<CommitId>, GitError> {
        let out = self.run_root(&["ls-tree", "HEAD", "--", path.as_str()])?;
        // `160000 commit <sha>\t<path>`
        let Some(line) = out.stdout.lines().next() else {
            return Ok(None);
        };
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some("160000"), Some("commit"), Some(sha)) => Ok(Some(CommitId::from(sha))),
            _ => Err(GitError::UnexpectedOutput {
                command: format!("git ls-tree HEAD -- {path}"),
                output: line.to_string(),
            }),
        }
    }

    fn checked_out(&self, path: &SubmodulePath) -> Result<Option<CommitId>, GitError> {
        if !self.is_initialized(path) {
            return Ok(None);
        }
        self.rev_parse(&self.submodule_dir(path), "HEAD").map(Some)
    }

    fn describe(&self, path: &SubmodulePath) -> Result<Option<String>, GitError> {
        if !self.is_initialized(path) {
            return Ok(None);
        }
        let dir = self.submodule_dir(path);
        match self.run(&dir, &["describe", "--tags", "--always", "--dirty"]) {
            Ok(out) => {
                let label = out.stdout.trim();
                Ok((!label.is_empty()).then(|| label.to_string()))
            }
            Err(GitError::Failed { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn fetch_remote_tip(&self, record: &SubmoduleRecord) -> Result<CommitId, GitError> {
        if self.is_initialized(&record.path) {
            let dir = self.submodule_dir(&record.path);
            self.run(&dir, &["fetch", "--quiet", SUBMODULE_REMOTE])?;
            return self.rev_parse(&dir, &record.remote_ref(SUBMODULE_REMOTE));
        }

        // Not cloned yet: ask the remote directly, nothing is written locally.
        let wanted = match record.branch.as_deref() {
            Some(branch) => format!("refs/heads/{branch}"),
            None => "HEAD".to_string(),
        };
        let url = self.submodule_url(record)?;
        let out = self.run_root(&["ls-remote", &url, &wanted])?;
        let command = format!("git ls-remote {url} {wanted}");
        let line = out
            .stdout
            .lines()
            .find(|line| line.split_whitespace().nth(1) == Some(wanted.as_str()))
            .ok_or_else(|| GitError::UnexpectedOutput {
                command: command.clone(),
                output: format!("ref '{wanted}' not found on remote"),
            })?;
        parse_commit_id(&command, line)
    }

    fn commits_between(
        &self,
        path: &SubmodulePath,
        from: &CommitId,
        to: &CommitId,
    ) -> Result<Option<u64>, GitError> {
        if !self.is_initialized(path) {
            return Ok(None);
        }
        let dir = self.submodule_dir(path);
        let range = format!("{from}..{to}");
        match self.run(&dir, &["rev-list", "--count", &range]) {
            Ok(out) => {
                let count = out.stdout.trim().parse::<u64>().map_err(|_| {
                    GitError::UnexpectedOutput {
                        command: format!("git rev-list --count {range}"),
                        output: out.stdout.trim().to_string(),
                    }
                })?;
                Ok(Some(count))
            }
            // The recorded commit may be missing from a shallow clone.
            Err(GitError::Failed { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn update_remote(&self, path: &SubmodulePath) -> Result<(), GitError> {
        self.run_root(&[
            "submodule",
            "update",
            "--init",
            "--recursive",
            "--remote",
            "--",
            path.as_str(),
        ])?;
        Ok(())
    }

    fn changed_submodules(&self, paths: &[SubmodulePath]) -> Result<Vec<SubmodulePath>, GitError> {
        if paths.is_empty() {
            return Ok(vec![]);
        }
        let mut args = vec![
            "diff",
            "--name-only",
            "--ignore-submodules=dirty",
            "HEAD",
            "--",
        ];
        args.extend(paths.iter().map(|p| p.as_str()));
        let out = self.run_root(&args)?;

        let changed: Vec<&str> = out.stdout.lines().map(str::trim).collect();
        Ok(paths
            .iter()
            .filter(|p| changed.contains(&p.as_str()))
            .cloned()
            .collect())
    }

    fn stage(&self, paths: &[SubmodulePath]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(|p| p.as_str()));
        self.run_root(&args)?;
        Ok(())
    }

    fn commit(&self, paths: &[SubmodulePath], message: &str) -> Result<Option<CommitId>, GitError> {
        if paths.is_empty() {
            return Ok(None);
        }
        let mut args = vec!["commit", "--quiet", "-m", message, "--"];
        args.extend(paths.iter().map(|p| p.as_str()));
        match self.run_root(&args) {
            Ok(_) => {}
            Err(GitError::Failed { stderr, .. })
                if stderr.contains("nothing to commit") || stderr.contains("no changes added") =>
            {
                tracing::info!("git reported nothing to commit");
                return Ok(None);
            }
            Err(err) => return Err(err),
        }
        self.rev_parse(&self.root, "HEAD").map(Some)
    }

    fn push(&self, remote: &str) -> Result<(), GitError> {
        self.run_root(&["push", "--quiet", remote, "HEAD"])?;
        Ok(())
    }
}

fn is_relative_url(url: &str) -> bool {
    url.starts_with("./") || url.starts_with("../")
}

/// Join a relative submodule URL onto `base`, one `..` per path component.
/// Handles `scheme://host/path`, scp-style `host:path`, and plain paths.
fn resolve_relative_url(base: &str, relative: &str) -> String {
    let mut base = base.trim_end_matches('/').to_string();
    let mut separator = '/';
    let mut rest = relative;
    loop {
        if let Some(tail) = rest.strip_prefix("./") {
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("../") {
            rest = tail;
            // Never strip into the `scheme://` part.
            let floor = base.find("://").map_or(0, |i| i + 3);
            if let Some(slash) = base[floor..].rfind('/') {
                base.truncate(floor + slash);
                separator = '/';
            } else if let Some(colon) = base[floor..].rfind(':') {
                base.truncate(floor + colon);
                separator = ':';
            } else {
                base = ".".to_string();
                separator = '/';
            }
        } else {
            break;
        }
    }
    format!("{base}{separator}{rest}")
}

fn parse_commit_id(command: &str, text: &str) -> Result<CommitId, GitError> {
    let sha = text.split_whitespace().next().unwrap_or_default();
    let valid = sha.len() >= 40 && sha.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(GitError::UnexpectedOutput {
            command: command.to_string(),
            output: text.trim().to_string(),
        });
    }
    Ok(CommitId::from(sha))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commit_id_accepts_sha1_and_ls_remote_lines() {
        let sha = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(parse_commit_id("x", sha).unwrap().0, sha);
        assert_eq!(
            parse_commit_id("x", &format!("{sha}\trefs/heads/main\n")).unwrap().0,
            sha
        );
    }

    #[test]
    fn parse_commit_id_rejects_garbage() {
        assert!(matches!(
            parse_commit_id("git rev-parse HEAD", "fatal: bad revision"),
            Err(GitError::UnexpectedOutput { .. })
        ));
        assert!(parse_commit_id("x", "").is_err());
    }

    #[test]
    fn relative_urls_resolve_like_git() {
        let cases = [
            ("https://github.com/me/profile.git", "../cv.git", "https://github.com/me/cv.git"),
            ("https://github.com/me/profile.git/", "./cv", "https://github.com/me/profile.git/cv"),
            ("https://host/a/b/profile", "../../lib", "https://host/a/lib"),
            ("git@github.com:me/profile.git", "../cv.git", "git@github.com:me/cv.git"),
            ("git@github.com:profile.git", "../cv.git", "git@github.com:cv.git"),
            ("/srv/remotes/profile.git", "../cv", "/srv/remotes/cv"),
        ];
        for (base, relative, expected) in cases {
            assert_eq!(resolve_relative_url(base, relative), expected, "{base} + {relative}");
        }
        assert!(is_relative_url("../cv"));
        assert!(!is_relative_url("https://github.com/me/cv.git"));
        assert!(!is_relative_url("/srv/cv"));
    }

    #[test]
    fn uninitialized_submodule_has_no_checkout() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let git = ShellGit::new(dir.path());
        let path = SubmodulePath::from("cv");
        assert_eq!(git.checked_out(&path).expect("checked_out"), None);
        assert_eq!(git.describe(&path).expect("describe"), None);
        assert_eq!(
            git.commits_between(&path, &CommitId::from("a"), &CommitId::from("b"))
                .expect("count"),
            None
        );
    }
}
