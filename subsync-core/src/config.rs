//! Optional `.subsync.yaml` configuration and CI detection.
//!
//! Every field has a default, so a repository without a config file behaves
//! exactly like one with an empty file.
//!
//! ```yaml
//! remote: origin
//! commit_prefix: "chore(submodules): update"
//! ci_env_vars: [CI, GITHUB_ACTIONS]
//! git_config:
//!   protocol.file.allow: always
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

pub const CONFIG_FILE: &str = ".subsync.yaml";

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_COMMIT_PREFIX: &str = "chore(submodules): update";
pub const DEFAULT_CI_ENV_VARS: &[&str] = &["CI", "GITHUB_ACTIONS", "GITLAB_CI", "BUILDKITE", "JENKINS_URL"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote the parent repository pushes to.
    pub remote: String,
    /// First line prefix of the pointer-update commit message.
    pub commit_prefix: String,
    /// Environment variables whose presence signals an automated pipeline.
    pub ci_env_vars: Vec<String>,
    /// Extra `-c key=value` pairs passed to every git invocation.
    pub git_config: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            commit_prefix: DEFAULT_COMMIT_PREFIX.to_string(),
            ci_env_vars: DEFAULT_CI_ENV_VARS.iter().map(|v| v.to_string()).collect(),
            git_config: BTreeMap::new(),
        }
    }
}

impl Config {
    /// True when any configured CI variable is set to a truthy value.
    ///
    /// `lookup` abstracts the environment so callers and tests can inject it.
    pub fn is_automated<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        self.ci_env_vars
            .iter()
            .filter_map(|name| lookup(name))
            .any(|value| is_truthy(&value))
    }
}

fn is_truthy(value: &str) -> bool {
    let v = value.trim();
    !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false"))
}

/// `<root>/.subsync.yaml`
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load configuration.
///
/// With `explicit` set, that file must exist. Otherwise `<root>/.subsync.yaml`
/// is read when present and defaults are used when it is not.
pub fn load_at(root: &Path, explicit: Option<&Path>) -> Result<Config, CoreError> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(CoreError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path_at(root);
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse { path, source })
}
