//! Commit message for a pointer-update commit.
//!
//! Output depends only on its inputs, so repeated runs against the same
//! upstream state produce byte-identical messages.

use std::fmt::Write;

use subsync_core::{CommitId, SubmodulePath};

/// One advanced pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerChange {
    pub path: SubmodulePath,
    pub from: Option<CommitId>,
    pub to: Option<CommitId>,
}

/// ```text
/// chore(submodules): update cv, README
///
/// - cv: 1a2b3c4 -> 5d6e7f8
/// - README: 0a0b0c0 -> 9f9e9d9
/// ```
pub fn render(prefix: &str, changes: &[PointerChange]) -> String {
    let names: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
    let mut message = format!("{} {}\n\n", prefix.trim_end(), names.join(", "));
    for change in changes {
        let _ = writeln!(
            message,
            "- {}: {} -> {}",
            change.path,
            short_or_none(change.from.as_ref()),
            short_or_none(change.to.as_ref()),
        );
    }
    message
}

fn short_or_none(id: Option<&CommitId>) -> &str {
    id.map(CommitId::short).unwrap_or("(none)")
}
