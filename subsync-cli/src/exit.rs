//! Process exit codes.

use subsync_core::CoreError;
use subsync_sync::SyncError;

pub const SUCCESS: u8 = 0;
/// Not at the repository root, unknown submodule, lock held, bad config.
pub const PRECONDITION: u8 = 1;
/// Fetch, update, or push failed for at least one target.
pub const FAILURE: u8 = 2;
/// Pointer changes were applied (only with `--detailed-exitcode`).
pub const CHANGED: u8 = 3;

/// Map an aborting error to its exit code by walking the cause chain.
pub fn code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(sync) = cause.downcast_ref::<SyncError>() {
            return if sync.is_precondition() {
                PRECONDITION
            } else {
                FAILURE
            };
        }
        if cause.downcast_ref::<CoreError>().is_some() {
            return PRECONDITION;
        }
    }
    FAILURE
}
