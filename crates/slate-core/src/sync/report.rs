//! Structured result of one reconciliation run.
//!
//! Built fresh per run, never merged across runs. Everything serializes so
//! the CLI can render it either as JSON or human output, and so callers can
//! persist the proposed mutations (remote refs, pulled snapshots, conflict
//! flags) back onto their store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conflict::ConflictType;
use crate::github::Issue;
use crate::model::task::Task;

/// What the push phase did with one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushOp {
    Created,
    Updated,
    Closed,
    Reopened,
    Unchanged,
}

/// What the pull phase did with one issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullOp {
    New,
    Updated,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub pushed: usize,
    pub pulled: usize,
    pub unchanged: usize,
    pub conflicts: usize,
    pub errors: usize,
}

/// Per-task push outcome, with the sync metadata the caller should persist.
///
/// `synced_at` is set only when a remote write happened; an `unchanged`
/// record proposes no metadata change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRecord {
    pub task_id: String,
    pub operation: PushOp,
    pub issue_number: Option<u64>,
    pub issue_url: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
}

/// Per-issue pull outcome carrying the decoded task snapshot to upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRecord {
    pub issue_number: u64,
    pub operation: PullOp,
    pub task: Task,
}

/// A pairing where both sides changed since the last sync. Surfaced for a
/// human decision, never merged automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub task_id: String,
    pub issue_number: u64,
    pub conflict_type: ConflictType,
    pub task: Task,
    pub issue: Issue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncErrorRecord {
    pub operation: String,
    pub task_id: Option<String>,
    pub issue_number: Option<u64>,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub summary: SyncSummary,
    pub pushed: Vec<PushRecord>,
    pub pulled: Vec<PullRecord>,
    pub conflicts: Vec<ConflictRecord>,
    pub errors: Vec<SyncErrorRecord>,
}

impl Default for SyncResult {
    fn default() -> Self {
        Self {
            success: true,
            summary: SyncSummary::default(),
            pushed: Vec::new(),
            pulled: Vec::new(),
            conflicts: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl SyncResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_push(&mut self, record: PushRecord) {
        if record.operation == PushOp::Unchanged {
            self.summary.unchanged += 1;
        } else {
            self.summary.pushed += 1;
        }
        self.pushed.push(record);
    }

    pub fn record_pull(&mut self, record: PullRecord) {
        self.summary.pulled += 1;
        self.pulled.push(record);
    }

    /// A pull-side pairing that needed no action; counted, not listed.
    pub fn record_unchanged(&mut self) {
        self.summary.unchanged += 1;
    }

    pub fn record_conflict(&mut self, record: ConflictRecord) {
        self.summary.conflicts += 1;
        self.conflicts.push(record);
    }

    pub fn record_error(&mut self, record: SyncErrorRecord) {
        self.summary.errors += 1;
        self.success = false;
        self.errors.push(record);
    }
}
