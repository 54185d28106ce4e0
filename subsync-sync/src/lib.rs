//! # subsync-sync
//!
//! Submodule synchronization: fetch each submodule's tracked branch, detect
//! pointer drift in the parent repository, and commit/push the result.
//!
//! Build an [`Orchestrator`] over a [`Git`] backend ([`ShellGit`] in
//! production) and call [`Orchestrator::status`], [`Orchestrator::check`],
//! or [`Orchestrator::update`].

pub mod error;
pub mod git;
pub mod lock;
pub mod message;
pub mod orchestrator;
pub mod report;

#[cfg(test)]
mod fake;

pub use error::{GitError, SyncError};
pub use git::{Git, ShellGit};
pub use orchestrator::{Orchestrator, SyncScope, UpdateOptions};
pub use report::{
    CheckEntry, CheckOutcome, CheckReport, CommitOutcome, PushOutcome, SubmoduleStatus,
    SyncReport, UpdateEntry, UpdateOutcome,
};
