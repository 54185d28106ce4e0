//! Exit-code and output contract for runs that never reach a git remote.
//!
//! The working directory is a temp dir with a bare `.git` directory, which is
//! enough for the repository-root precondition; no `git` executable is needed.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const CI_VARS: &[&str] = &["CI", "GITHUB_ACTIONS", "GITLAB_CI", "BUILDKITE", "JENKINS_URL"];

fn subsync(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("subsync"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    for var in CI_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn repo_root() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    fs::create_dir(tmp.path().join(".git")).expect("create .git");
    tmp
}

fn with_gitmodules(root: &TempDir) {
    fs::write(
        root.path().join(".gitmodules"),
        "[submodule \"cv\"]\n\tpath = cv\n\turl = https://example.com/cv.git\n\tbranch = main\n",
    )
    .expect("write .gitmodules");
}

#[test]
fn outside_repository_root_is_a_precondition_failure() {
    let tmp = TempDir::new().expect("tempdir");
    subsync(tmp.path())
        .assert()
        .code(1)
        .stderr(contains("not a repository root"));
    subsync(tmp.path()).arg("--status").assert().code(1);
    subsync(tmp.path()).arg("--check").assert().code(1);
}

#[test]
fn nested_directory_is_not_the_root() {
    let root = repo_root();
    let nested = root.path().join("docs");
    fs::create_dir(&nested).expect("mkdir");
    subsync(&nested).arg("--status").assert().code(1);
}

#[test]
fn unknown_path_fails_before_any_change() {
    let root = repo_root();
    with_gitmodules(&root);

    subsync(root.path())
        .arg("nope")
        .assert()
        .code(1)
        .stderr(contains("submodule 'nope' not found"));
    assert!(
        !root.path().join(".git/subsync.lock").exists(),
        "lock must not be left behind"
    );

    subsync(root.path())
        .args(["--check", "nope"])
        .assert()
        .code(1)
        .stderr(contains("not found"));
}

#[test]
fn status_without_submodules() {
    let root = repo_root();
    subsync(root.path())
        .arg("--status")
        .assert()
        .success()
        .stdout(contains("No submodules configured."));
}

#[test]
fn status_json_without_submodules() {
    let root = repo_root();
    let output = subsync(root.path())
        .args(["--status", "--json"])
        .output()
        .expect("run subsync");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["submodules"], serde_json::json!([]));
}

#[test]
fn check_without_submodules() {
    let root = repo_root();
    subsync(root.path())
        .arg("--check")
        .assert()
        .success()
        .stdout(contains("No submodules configured."));
}

#[test]
fn update_without_submodules_is_nothing_to_do() {
    let root = repo_root();
    subsync(root.path())
        .assert()
        .success()
        .stdout(contains("nothing to commit"));
    subsync(root.path())
        .arg("--detailed-exitcode")
        .assert()
        .code(0);
    assert!(!root.path().join(".git/subsync.lock").exists());
}

#[test]
fn conflicting_modes_are_usage_errors() {
    let root = repo_root();
    subsync(root.path())
        .args(["--status", "--check"])
        .assert()
        .code(1);
    subsync(root.path())
        .args(["--check", "--no-commit"])
        .assert()
        .code(1);
    subsync(root.path()).arg("--bogus").assert().code(1);
}

#[test]
fn help_is_not_an_error() {
    let root = repo_root();
    subsync(root.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--no-commit").and(contains("--status")));
}

#[test]
fn malformed_config_is_a_precondition_failure() {
    let root = repo_root();
    fs::write(root.path().join(".subsync.yaml"), "remote: [unterminated\n").expect("write");
    subsync(root.path())
        .arg("--status")
        .assert()
        .code(1)
        .stderr(contains("failed to parse config"));
}

#[test]
fn unknown_config_key_is_rejected() {
    let root = repo_root();
    fs::write(root.path().join(".subsync.yaml"), "remtoe: upstream\n").expect("write");
    subsync(root.path()).assert().code(1);
}

#[test]
fn missing_explicit_config_is_a_precondition_failure() {
    let root = repo_root();
    subsync(root.path())
        .args(["--config", "missing.yaml", "--status"])
        .assert()
        .code(1)
        .stderr(contains("config file not found"));
}

#[test]
fn held_lock_blocks_update_but_not_status() {
    let root = repo_root();
    let lock = root.path().join(".git/subsync.lock");
    fs::write(&lock, "4242\n").expect("write lock");

    subsync(root.path()).assert().code(1);
    assert!(lock.exists(), "a foreign lock must not be removed");

    subsync(root.path()).arg("--status").assert().success();
}
