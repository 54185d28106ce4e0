//! subsync core library — submodule records, repository preconditions, config.
//!
//! - [`types`] — newtypes and the [`SubmoduleRecord`] domain struct
//! - [`error`] — [`CoreError`]
//! - [`gitmodules`] — `.gitmodules` parsing and target selection
//! - [`repo`] — repository-root precondition and git-dir discovery
//! - [`config`] — optional `.subsync.yaml` and CI detection

pub mod config;
pub mod error;
pub mod gitmodules;
pub mod repo;
pub mod types;

pub use config::Config;
pub use error::CoreError;
pub use repo::RepoRoot;
pub use types::{CommitId, SubmodulePath, SubmoduleRecord};
