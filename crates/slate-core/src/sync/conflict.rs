//! Three-timestamp conflict classification.
//!
//! A pairing is compared through `last_synced_at` (the fence), the latest
//! local edit, and the issue's remote `updated_at`. Push-side and pull-side
//! detection share this one function, so the classification is symmetric by
//! construction.

use serde::{Deserialize, Serialize};

use crate::github::Issue;
use crate::model::task::Task;

/// The kinds of conflict the result schema can carry.
///
/// Only `both-modified` is ever produced. The deletion variants are part of
/// the schema for forward compatibility; no detection logic exists for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    BothModified,
    LocalDeleted,
    RemoteDeleted,
}

impl ConflictType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BothModified => "both-modified",
            Self::LocalDeleted => "local-deleted",
            Self::RemoteDeleted => "remote-deleted",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pairing stands relative to its last sync fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Never synced: either direction proceeds, the other side is adopted
    /// or overwritten.
    FirstSync,
    /// Neither side changed since the fence.
    InSync,
    /// Only the local task changed; safe to push.
    LocalAhead,
    /// Only the remote issue changed; safe to pull.
    RemoteAhead,
    /// Both sides changed; surfaced, never merged.
    Conflict(ConflictType),
}

impl Disposition {
    #[must_use]
    pub const fn is_conflict(self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Classify one (task, issue) pairing.
#[must_use]
pub fn classify(task: &Task, issue: &Issue) -> Disposition {
    let Some(synced_at) = task.sync.last_synced_at else {
        return Disposition::FirstSync;
    };

    let local_changed = task.local_modified_at() > synced_at;
    let remote_changed = issue.updated_at > synced_at;

    match (local_changed, remote_changed) {
        (true, true) => Disposition::Conflict(ConflictType::BothModified),
        (true, false) => Disposition::LocalAhead,
        (false, true) => Disposition::RemoteAhead,
        (false, false) => Disposition::InSync,
    }
}
