//! The reconciliation orchestrator.
//!
//! One run is a single linear pass: ensure labels, snapshot the remote
//! issue list, then walk the push phase and/or pull phase over that
//! snapshot. All remote calls are sequential with flat pacing between
//! iterations; each phase keeps its own counter. The engine works on task
//! snapshots and proposes mutations through the [`SyncResult`]; persisting
//! them is the caller's job.
//!
//! Runs must be serialized by the caller. The engine holds no locks and
//! reads the remote snapshot once, so concurrent runs can go stale against
//! each other.

use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::codec::{self, MARKER_LABEL};
use super::conflict::{self, Disposition};
use super::labels;
use super::matcher;
use super::report::{
    ConflictRecord, PullOp, PullRecord, PushOp, PushRecord, SyncErrorRecord, SyncResult,
};
use crate::github::{
    GithubClient, GithubError, Issue, IssuePatch, IssueState, IssueTracker, NewIssue, RepoSlug,
};
use crate::model::task::{ParseEnumError, Task};

/// Which phases a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Push,
    Pull,
    Both,
}

impl Direction {
    #[must_use]
    pub const fn includes_push(self) -> bool {
        matches!(self, Self::Push | Self::Both)
    }

    #[must_use]
    pub const fn includes_pull(self) -> bool {
        matches!(self, Self::Pull | Self::Both)
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Push
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Both => "both",
        })
    }
}

impl FromStr for Direction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "pull" => Ok(Self::Pull),
            "both" => Ok(Self::Both),
            _ => Err(ParseEnumError {
                expected: "direction",
                got: s.to_string(),
            }),
        }
    }
}

/// Everything the engine needs, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub repo: RepoSlug,
    pub token: String,
    /// Flat delay between consecutive iterations within a phase.
    pub pacing: Duration,
    /// API base override; defaults to the public endpoint.
    pub base_url: Option<String>,
}

impl EngineConfig {
    pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

    #[must_use]
    pub fn new(repo: RepoSlug, token: String) -> Self {
        Self {
            repo,
            token,
            pacing: Self::DEFAULT_PACING,
            base_url: None,
        }
    }
}

enum PhaseEnd {
    Completed,
    Aborted,
}

enum PushOutcome {
    Pushed(PushRecord),
    Conflicted(ConflictRecord),
}

/// Drives one reconciliation run against an [`IssueTracker`].
pub struct SyncEngine<T = GithubClient> {
    tracker: T,
    pacing: Duration,
    cancel: Arc<AtomicBool>,
}

impl SyncEngine<GithubClient> {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let client = match config.base_url {
            Some(base) => GithubClient::with_base_url(config.repo, config.token, base),
            None => GithubClient::new(config.repo, config.token),
        };
        Self::with_tracker(client, config.pacing)
    }
}

impl<T: IssueTracker> SyncEngine<T> {
    /// Build an engine over any tracker implementation. Tests pass a fake.
    #[must_use]
    pub fn with_tracker(tracker: T, pacing: Duration) -> Self {
        Self {
            tracker,
            pacing,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Handle for coarse caller-driven cancellation. Setting it aborts the
    /// run at the next item boundary; the partial result is returned as-is
    /// and should be treated as incomplete.
    #[must_use]
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn pace(&self, already_processed: usize) {
        if already_processed > 0 && !self.pacing.is_zero() {
            std::thread::sleep(self.pacing);
        }
    }

    /// Execute one sync run over a snapshot of the local task list.
    pub fn run(&self, tasks: &[Task], direction: Direction) -> SyncResult {
        let mut result = SyncResult::new();

        let label_report = labels::ensure_labels(&self.tracker, &labels::required_labels(tasks));
        if label_report.auth_failed {
            result.record_error(fatal_auth_error("ensure_labels"));
            return result;
        }
        for err in label_report.errors {
            result.record_error(err);
        }
        if !label_report.created.is_empty() {
            tracing::info!(count = label_report.created.len(), "created missing labels");
        }

        let issues = match self.tracker.list_issues(MARKER_LABEL) {
            Ok(issues) => issues,
            Err(err) if err.is_auth_failure() => {
                result.record_error(fatal_auth_error("list_issues"));
                return result;
            }
            Err(err) => {
                // Degraded: push treats every task as unmatched, pull has
                // nothing to walk.
                tracing::warn!("issue listing failed, continuing with empty snapshot: {err}");
                result.record_error(SyncErrorRecord {
                    operation: "list_issues".to_string(),
                    task_id: None,
                    issue_number: None,
                    message: err.to_string(),
                    retryable: true,
                });
                Vec::new()
            }
        };

        let mut claimed_issues: HashSet<u64> = HashSet::new();
        let mut conflicted_issues: HashSet<u64> = HashSet::new();
        let mut conflicted_tasks: HashSet<String> = HashSet::new();

        if direction.includes_push() {
            let end = self.push_phase(
                tasks,
                &issues,
                &mut result,
                &mut claimed_issues,
                &mut conflicted_issues,
                &mut conflicted_tasks,
            );
            if matches!(end, PhaseEnd::Aborted) {
                return result;
            }
        }

        if direction.includes_pull() {
            let end = self.pull_phase(
                tasks,
                &issues,
                &mut result,
                &conflicted_issues,
                &mut conflicted_tasks,
            );
            if matches!(end, PhaseEnd::Aborted) {
                return result;
            }
        }

        tracing::info!(
            pushed = result.summary.pushed,
            pulled = result.summary.pulled,
            unchanged = result.summary.unchanged,
            conflicts = result.summary.conflicts,
            errors = result.summary.errors,
            "sync run finished"
        );
        result
    }

    fn push_phase(
        &self,
        tasks: &[Task],
        issues: &[Issue],
        result: &mut SyncResult,
        claimed_issues: &mut HashSet<u64>,
        conflicted_issues: &mut HashSet<u64>,
        conflicted_tasks: &mut HashSet<String>,
    ) -> PhaseEnd {
        let mut processed = 0_usize;

        for task in tasks {
            if self.cancelled() {
                tracing::info!("push phase cancelled");
                return PhaseEnd::Aborted;
            }
            self.pace(processed);
            processed += 1;

            match self.push_task(task, issues, claimed_issues) {
                Ok(PushOutcome::Pushed(record)) => result.record_push(record),
                Ok(PushOutcome::Conflicted(record)) => {
                    conflicted_issues.insert(record.issue_number);
                    conflicted_tasks.insert(record.task_id.clone());
                    result.record_conflict(record);
                }
                Err(err) if err.is_auth_failure() => {
                    result.record_error(fatal_auth_error("push"));
                    return PhaseEnd::Aborted;
                }
                Err(err) => {
                    tracing::warn!(task = %task.id, "push failed: {err}");
                    result.record_error(SyncErrorRecord {
                        operation: "push".to_string(),
                        task_id: Some(task.id.clone()),
                        issue_number: task.sync.issue_number,
                        message: err.to_string(),
                        retryable: true,
                    });
                }
            }
        }

        PhaseEnd::Completed
    }

    fn push_task(
        &self,
        task: &Task,
        issues: &[Issue],
        claimed_issues: &mut HashSet<u64>,
    ) -> Result<PushOutcome, GithubError> {
        let Some(issue) = matcher::match_issue(task, issues, claimed_issues) else {
            return self.push_create(task);
        };
        claimed_issues.insert(issue.number);

        if let Disposition::Conflict(kind) = conflict::classify(task, issue) {
            return Ok(PushOutcome::Conflicted(ConflictRecord {
                task_id: task.id.clone(),
                issue_number: issue.number,
                conflict_type: kind,
                task: task.clone(),
                issue: issue.clone(),
            }));
        }

        let desired_body = codec::encode_issue_body(task);
        let desired_labels = codec::encode_labels(task);
        let desired_closed = task.status.is_terminal();

        let observed_labels: BTreeSet<String> = issue
            .labels
            .iter()
            .map(|label| label.name.clone())
            .collect();
        let content_differs = issue.title != task.title
            || issue.body.as_deref().map(str::trim) != Some(desired_body.trim())
            || observed_labels != desired_labels;
        let state_differs = issue.state.is_closed() != desired_closed;

        if !content_differs && !state_differs {
            return Ok(PushOutcome::Pushed(PushRecord {
                task_id: task.id.clone(),
                operation: PushOp::Unchanged,
                issue_number: Some(issue.number),
                issue_url: Some(issue.html_url.clone()),
                synced_at: None,
            }));
        }

        let patch = IssuePatch {
            title: Some(task.title.clone()),
            body: Some(desired_body),
            labels: Some(desired_labels.into_iter().collect()),
            state: state_differs.then_some(if desired_closed {
                IssueState::Closed
            } else {
                IssueState::Open
            }),
        };
        let updated = self.tracker.update_issue(issue.number, &patch)?;

        let operation = if state_differs {
            if desired_closed {
                PushOp::Closed
            } else {
                PushOp::Reopened
            }
        } else {
            PushOp::Updated
        };

        Ok(PushOutcome::Pushed(PushRecord {
            task_id: task.id.clone(),
            operation,
            issue_number: Some(updated.number),
            issue_url: Some(updated.html_url),
            synced_at: Some(Utc::now()),
        }))
    }

    fn push_create(&self, task: &Task) -> Result<PushOutcome, GithubError> {
        let new = NewIssue {
            title: task.title.clone(),
            body: codec::encode_issue_body(task),
            labels: codec::encode_labels(task).into_iter().collect(),
        };
        let created = self.tracker.create_issue(&new)?;

        // Create does not accept a state; a terminal task needs a second
        // call to close the fresh issue.
        if task.status.is_terminal() {
            self.tracker.update_issue(
                created.number,
                &IssuePatch {
                    state: Some(IssueState::Closed),
                    ..IssuePatch::default()
                },
            )?;
        }

        Ok(PushOutcome::Pushed(PushRecord {
            task_id: task.id.clone(),
            operation: PushOp::Created,
            issue_number: Some(created.number),
            issue_url: Some(created.html_url),
            synced_at: Some(Utc::now()),
        }))
    }

    fn pull_phase(
        &self,
        tasks: &[Task],
        issues: &[Issue],
        result: &mut SyncResult,
        conflicted_issues: &HashSet<u64>,
        conflicted_tasks: &mut HashSet<String>,
    ) -> PhaseEnd {
        let mut processed = 0_usize;
        let mut paired_tasks: HashSet<String> = HashSet::new();

        for issue in issues {
            if self.cancelled() {
                tracing::info!("pull phase cancelled");
                return PhaseEnd::Aborted;
            }
            if conflicted_issues.contains(&issue.number) {
                continue;
            }
            self.pace(processed);
            processed += 1;

            let now = Utc::now();
            let owner = resolve_owner(issue, tasks);

            let Some(task) = owner else {
                if issue.state.is_closed() {
                    // Orphan: externally closed cleanup, not a resurrection
                    // candidate.
                    tracing::debug!(issue = issue.number, "skipping closed orphan issue");
                    continue;
                }
                let decoded = codec::decode_issue(issue, None, now);
                result.record_pull(PullRecord {
                    issue_number: issue.number,
                    operation: PullOp::New,
                    task: decoded,
                });
                continue;
            };

            if conflicted_tasks.contains(&task.id) || !paired_tasks.insert(task.id.clone()) {
                continue;
            }

            if issue.state.is_closed() && !task.status.is_terminal() {
                if let Disposition::Conflict(kind) = conflict::classify(task, issue) {
                    conflicted_tasks.insert(task.id.clone());
                    result.record_conflict(conflict_record(task, issue, kind));
                    continue;
                }
                let decoded = codec::decode_issue(issue, Some(task), now);
                result.record_pull(PullRecord {
                    issue_number: issue.number,
                    operation: PullOp::Closed,
                    task: decoded,
                });
                continue;
            }

            if let Some(synced_at) = task.sync.last_synced_at {
                if issue.updated_at <= synced_at {
                    result.record_unchanged();
                    continue;
                }
            }

            if let Disposition::Conflict(kind) = conflict::classify(task, issue) {
                conflicted_tasks.insert(task.id.clone());
                result.record_conflict(conflict_record(task, issue, kind));
                continue;
            }

            let decoded = codec::decode_issue(issue, Some(task), now);
            result.record_pull(PullRecord {
                issue_number: issue.number,
                operation: PullOp::Updated,
                task: decoded,
            });
        }

        PhaseEnd::Completed
    }
}

fn resolve_owner<'a>(issue: &Issue, tasks: &'a [Task]) -> Option<&'a Task> {
    let marker_id = issue.body.as_deref().and_then(codec::extract_marker_id);
    if let Some(id) = marker_id {
        if let Some(task) = tasks.iter().find(|task| task.id == id) {
            return Some(task);
        }
    }
    tasks
        .iter()
        .find(|task| task.sync.issue_number == Some(issue.number))
}

fn conflict_record(task: &Task, issue: &Issue, kind: super::conflict::ConflictType) -> ConflictRecord {
    ConflictRecord {
        task_id: task.id.clone(),
        issue_number: issue.number,
        conflict_type: kind,
        task: task.clone(),
        issue: issue.clone(),
    }
}

fn fatal_auth_error(operation: &str) -> SyncErrorRecord {
    SyncErrorRecord {
        operation: operation.to_string(),
        task_id: None,
        issue_number: None,
        message: "GitHub rejected the token (401); aborting run".to_string(),
        retryable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, SyncEngine};
    use crate::github::{
        GithubError, Issue, IssuePatch, IssueState, IssueTracker, Label, LabelCreation, LabelSpec,
        NewIssue,
    };
    use crate::model::task::{Status, SyncStatus, Task};
    use crate::sync::codec::{encode_issue_body, encode_labels};
    use crate::sync::conflict::ConflictType;
    use crate::sync::report::{PullOp, PushOp};
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::time::Duration;

    /// In-memory tracker with call counters and failure switches.
    #[derive(Default)]
    struct FakeTracker {
        labels: RefCell<Vec<Label>>,
        issues: RefCell<Vec<Issue>>,
        next_number: Cell<u64>,
        create_issue_calls: Cell<usize>,
        update_issue_calls: Cell<usize>,
        create_label_calls: Cell<usize>,
        patches: RefCell<Vec<(u64, IssuePatch)>>,
        fail_list_issues: Cell<bool>,
        unauthorized: Cell<bool>,
    }

    impl FakeTracker {
        fn new() -> Self {
            let tracker = Self::default();
            tracker.next_number.set(1);
            tracker
        }

        fn with_issues(issues: Vec<Issue>) -> Self {
            let tracker = Self::new();
            let max = issues.iter().map(|issue| issue.number).max().unwrap_or(0);
            tracker.next_number.set(max + 1);
            *tracker.issues.borrow_mut() = issues;
            tracker
        }
    }

    impl IssueTracker for FakeTracker {
        fn list_labels(&self) -> Result<Vec<Label>, GithubError> {
            if self.unauthorized.get() {
                return Err(GithubError::Status {
                    status: 401,
                    body: "Bad credentials".to_string(),
                });
            }
            Ok(self.labels.borrow().clone())
        }

        fn create_label(&self, spec: &LabelSpec) -> Result<LabelCreation, GithubError> {
            self.create_label_calls.set(self.create_label_calls.get() + 1);
            let mut labels = self.labels.borrow_mut();
            if labels
                .iter()
                .any(|label| label.name.eq_ignore_ascii_case(&spec.name))
            {
                return Ok(LabelCreation::AlreadyExists);
            }
            labels.push(Label {
                name: spec.name.clone(),
            });
            Ok(LabelCreation::Created)
        }

        fn list_issues(&self, label: &str) -> Result<Vec<Issue>, GithubError> {
            if self.fail_list_issues.get() {
                return Err(GithubError::Transport("connection reset".to_string()));
            }
            Ok(self
                .issues
                .borrow()
                .iter()
                .filter(|issue| issue.has_label(label))
                .cloned()
                .collect())
        }

        fn create_issue(&self, new: &NewIssue) -> Result<Issue, GithubError> {
            self.create_issue_calls.set(self.create_issue_calls.get() + 1);
            let number = self.next_number.get();
            self.next_number.set(number + 1);
            let now = Utc::now();
            let issue = Issue {
                number,
                title: new.title.clone(),
                body: Some(new.body.clone()),
                state: IssueState::Open,
                labels: new
                    .labels
                    .iter()
                    .map(|name| Label { name: name.clone() })
                    .collect(),
                created_at: now,
                updated_at: now,
                html_url: format!("https://github.com/acme/widget/issues/{number}"),
                pull_request: None,
            };
            self.issues.borrow_mut().push(issue.clone());
            Ok(issue)
        }

        fn update_issue(&self, number: u64, patch: &IssuePatch) -> Result<Issue, GithubError> {
            self.update_issue_calls.set(self.update_issue_calls.get() + 1);
            self.patches.borrow_mut().push((number, patch.clone()));
            let mut issues = self.issues.borrow_mut();
            let issue = issues
                .iter_mut()
                .find(|issue| issue.number == number)
                .ok_or(GithubError::Status {
                    status: 404,
                    body: "not found".to_string(),
                })?;
            if let Some(title) = &patch.title {
                issue.title = title.clone();
            }
            if let Some(body) = &patch.body {
                issue.body = Some(body.clone());
            }
            if let Some(labels) = &patch.labels {
                issue.labels = labels
                    .iter()
                    .map(|name| Label { name: name.clone() })
                    .collect();
            }
            if let Some(state) = patch.state {
                issue.state = state;
            }
            issue.updated_at = Utc::now();
            Ok(issue.clone())
        }
    }

    fn engine(tracker: FakeTracker) -> SyncEngine<FakeTracker> {
        SyncEngine::with_tracker(tracker, Duration::ZERO)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn issue_for(task: &Task, number: u64, state: IssueState) -> Issue {
        Issue {
            number,
            title: task.title.clone(),
            body: Some(encode_issue_body(task)),
            state,
            labels: encode_labels(task)
                .into_iter()
                .map(|name| Label { name })
                .collect(),
            created_at: task.created_at,
            updated_at: task.created_at,
            html_url: format!("https://github.com/acme/widget/issues/{number}"),
            pull_request: None,
        }
    }

    // --- push scenarios ----------------------------------------------------

    #[test]
    fn push_create_makes_one_issue() {
        let mut task = Task::new("t1", "Fix login bug", t0());
        task.priority = "high".parse().unwrap();

        let engine = engine(FakeTracker::new());
        let result = engine.run(std::slice::from_ref(&task), Direction::Push);

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.summary.pushed, 1);
        assert_eq!(result.pushed.len(), 1);
        assert_eq!(result.pushed[0].operation, PushOp::Created);
        assert!(result.pushed[0].issue_number.is_some());
        assert!(result.pushed[0].synced_at.is_some());
        assert_eq!(engine.tracker().create_issue_calls.get(), 1);
        assert_eq!(engine.tracker().update_issue_calls.get(), 0);
    }

    #[test]
    fn push_create_ensures_labels_first() {
        let task = Task::new("t1", "Fix login bug", t0());
        let engine = engine(FakeTracker::new());
        engine.run(std::slice::from_ref(&task), Direction::Push);

        let labels = engine.tracker().labels.borrow();
        let names: HashSet<&str> = labels.iter().map(|label| label.name.as_str()).collect();
        assert!(names.contains("slate"));
        assert!(names.contains("priority:medium"));
    }

    #[test]
    fn push_create_of_terminal_task_closes_with_followup_patch() {
        let mut task = Task::new("t1", "Shipped already", t0());
        task.status = Status::ReadyToShip;

        let engine = engine(FakeTracker::new());
        let result = engine.run(std::slice::from_ref(&task), Direction::Push);

        assert_eq!(result.pushed[0].operation, PushOp::Created);
        assert_eq!(engine.tracker().create_issue_calls.get(), 1);
        assert_eq!(engine.tracker().update_issue_calls.get(), 1);
        let patches = engine.tracker().patches.borrow();
        assert_eq!(patches[0].1.state, Some(IssueState::Closed));
    }

    #[test]
    fn push_close_patches_matched_issue() {
        let mut task = Task::new("t1", "Fix login bug", t0() - ChronoDuration::days(1));
        let issue = issue_for(&task, 42, IssueState::Open);

        task.status = Status::ReadyToShip;
        task.sync.issue_number = Some(42);
        task.sync.last_synced_at = Some(t0());
        task.sync.last_local_change_at = Some(t0() + ChronoDuration::minutes(5));
        task.updated_at = t0() + ChronoDuration::minutes(5);

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Push);

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.summary.pushed, 1);
        assert_eq!(result.pushed[0].operation, PushOp::Closed);
        let patches = engine.tracker().patches.borrow();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, 42);
        assert_eq!(patches[0].1.state, Some(IssueState::Closed));
    }

    #[test]
    fn push_content_change_is_a_plain_update() {
        let mut task = Task::new("t1", "Old title", t0() - ChronoDuration::days(1));
        task.updated_at = t0() - ChronoDuration::days(1);
        let mut issue = issue_for(&task, 8, IssueState::Open);
        issue.updated_at = t0() - ChronoDuration::hours(4);

        task.title = "New title".to_string();
        task.sync.issue_number = Some(8);
        task.sync.last_synced_at = Some(t0());
        task.sync.last_local_change_at = Some(t0() + ChronoDuration::minutes(2));
        task.updated_at = t0() + ChronoDuration::minutes(2);

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Push);

        assert_eq!(result.pushed[0].operation, PushOp::Updated);
        let patches = engine.tracker().patches.borrow();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1.title.as_deref(), Some("New title"));
        assert_eq!(patches[0].1.state, None, "no state change in the patch");
    }

    #[test]
    fn push_reopen_when_task_left_terminal_state() {
        let mut task = Task::new("t1", "Back again", t0() - ChronoDuration::days(1));
        task.status = Status::ReadyToShip;
        let mut issue = issue_for(&task, 9, IssueState::Closed);
        issue.updated_at = t0() - ChronoDuration::hours(2);

        task.status = Status::InProgress;
        task.sync.issue_number = Some(9);
        task.sync.last_synced_at = Some(t0());
        task.sync.last_local_change_at = Some(t0() + ChronoDuration::minutes(1));
        task.updated_at = t0() + ChronoDuration::minutes(1);

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Push);

        assert_eq!(result.pushed[0].operation, PushOp::Reopened);
    }

    #[test]
    fn second_push_of_unchanged_task_is_a_no_op() {
        let mut task = Task::new("t1", "Fix login bug", t0() - ChronoDuration::days(1));
        task.updated_at = t0() - ChronoDuration::days(1);
        let mut issue = issue_for(&task, 7, IssueState::Open);
        issue.updated_at = t0() - ChronoDuration::hours(3);

        task.sync.issue_number = Some(7);
        task.sync.last_synced_at = Some(t0());

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Push);

        assert!(result.success);
        assert_eq!(result.summary.pushed, 0);
        assert_eq!(result.summary.unchanged, 1);
        assert_eq!(result.pushed[0].operation, PushOp::Unchanged);
        assert!(result.pushed[0].synced_at.is_none());
        assert_eq!(engine.tracker().create_issue_calls.get(), 0);
        assert_eq!(engine.tracker().update_issue_calls.get(), 0);
    }

    #[test]
    fn both_modified_pairing_is_a_conflict_and_skips_writes() {
        let mut task = Task::new("t1", "Contended", t0() - ChronoDuration::days(1));
        let mut issue = issue_for(&task, 5, IssueState::Open);

        task.sync.issue_number = Some(5);
        task.sync.last_synced_at = Some(t0());
        task.sync.last_local_change_at = Some(t0() + ChronoDuration::seconds(10));
        task.updated_at = t0() + ChronoDuration::seconds(10);
        issue.updated_at = t0() + ChronoDuration::seconds(5);

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Both);

        assert_eq!(result.summary.conflicts, 1);
        assert_eq!(result.conflicts.len(), 1, "conflict recorded once per run");
        assert_eq!(result.conflicts[0].conflict_type, ConflictType::BothModified);
        assert_eq!(result.conflicts[0].task_id, "t1");
        assert_eq!(result.conflicts[0].issue_number, 5);
        assert_eq!(engine.tracker().update_issue_calls.get(), 0);
        // The conflicted pairing is excluded from the pull phase.
        assert!(result.pulled.is_empty());
    }

    // --- pull scenarios ----------------------------------------------------

    fn plain_issue(number: u64, state: IssueState, updated_at: DateTime<Utc>) -> Issue {
        Issue {
            number,
            title: format!("Issue {number}"),
            body: None,
            state,
            labels: vec![Label {
                name: "slate".to_string(),
            }],
            created_at: updated_at,
            updated_at,
            html_url: format!("https://github.com/acme/widget/issues/{number}"),
            pull_request: None,
        }
    }

    #[test]
    fn pull_new_decodes_markerless_open_issue() {
        let mut issue = plain_issue(7, IssueState::Open, t0());
        issue.title = "Flaky test on CI".to_string();

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(&[], Direction::Pull);

        assert!(result.success);
        assert_eq!(result.summary.pulled, 1);
        assert_eq!(result.pulled[0].operation, PullOp::New);
        let task = &result.pulled[0].task;
        assert!(task.id.starts_with("gh-"), "synthetic id, got {}", task.id);
        assert_eq!(task.title, "Flaky test on CI");
        assert_eq!(task.sync.status, SyncStatus::Synced);
    }

    #[test]
    fn pull_skips_closed_orphan_issue() {
        let issue = plain_issue(11, IssueState::Closed, t0());
        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(&[], Direction::Pull);

        assert!(result.success);
        assert!(result.pulled.is_empty());
        assert_eq!(result.summary.pulled, 0);
    }

    #[test]
    fn pull_updates_task_when_only_remote_changed() {
        let mut task = Task::new("t1", "Old title", t0() - ChronoDuration::days(1));
        task.updated_at = t0() - ChronoDuration::days(1);
        task.sync.issue_number = Some(3);
        task.sync.last_synced_at = Some(t0());

        let mut issue = issue_for(&task, 3, IssueState::Open);
        issue.title = "New title from remote".to_string();
        issue.updated_at = t0() + ChronoDuration::hours(1);

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Pull);

        assert_eq!(result.summary.pulled, 1);
        assert_eq!(result.pulled[0].operation, PullOp::Updated);
        assert_eq!(result.pulled[0].task.title, "New title from remote");
        assert_eq!(result.pulled[0].task.id, "t1");
    }

    #[test]
    fn pull_closed_issue_moves_task_to_terminal() {
        let mut task = Task::new("t1", "Being shipped", t0() - ChronoDuration::days(1));
        task.updated_at = t0() - ChronoDuration::days(1);
        task.status = Status::Review;
        task.sync.issue_number = Some(4);
        task.sync.last_synced_at = Some(t0());

        let mut issue = issue_for(&task, 4, IssueState::Closed);
        issue.updated_at = t0() + ChronoDuration::hours(1);

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Pull);

        assert_eq!(result.pulled[0].operation, PullOp::Closed);
        assert_eq!(result.pulled[0].task.status, Status::ReadyToShip);
    }

    #[test]
    fn pull_leaves_stale_pairing_alone() {
        let mut task = Task::new("t1", "Quiet", t0() - ChronoDuration::days(1));
        task.updated_at = t0() - ChronoDuration::days(1);
        task.sync.issue_number = Some(6);
        task.sync.last_synced_at = Some(t0());

        let mut issue = issue_for(&task, 6, IssueState::Open);
        issue.updated_at = t0() - ChronoDuration::hours(2);

        let engine = engine(FakeTracker::with_issues(vec![issue]));
        let result = engine.run(std::slice::from_ref(&task), Direction::Pull);

        assert!(result.pulled.is_empty());
        assert_eq!(result.summary.unchanged, 1);
    }

    // --- degraded and fatal paths -----------------------------------------

    #[test]
    fn issue_listing_failure_degrades_to_create_everything() {
        let task = Task::new("t1", "Fix login bug", t0());
        let tracker = FakeTracker::new();
        tracker.fail_list_issues.set(true);

        let engine = engine(tracker);
        let result = engine.run(std::slice::from_ref(&task), Direction::Both);

        assert!(!result.success);
        assert_eq!(result.summary.errors, 1);
        assert_eq!(result.errors[0].operation, "list_issues");
        assert!(result.errors[0].retryable);
        // Push fell back to creating; pull had nothing to walk.
        assert_eq!(result.summary.pushed, 1);
        assert_eq!(result.pushed[0].operation, PushOp::Created);
        assert!(result.pulled.is_empty());
    }

    #[test]
    fn auth_failure_aborts_the_run() {
        let task = Task::new("t1", "Fix login bug", t0());
        let tracker = FakeTracker::new();
        tracker.unauthorized.set(true);

        let engine = engine(tracker);
        let result = engine.run(std::slice::from_ref(&task), Direction::Both);

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(!result.errors[0].retryable);
        assert!(result.pushed.is_empty());
        assert_eq!(engine.tracker().create_issue_calls.get(), 0);
    }

    #[test]
    fn cancelled_run_returns_partial_result() {
        let tasks = vec![
            Task::new("t1", "One", t0()),
            Task::new("t2", "Two", t0()),
        ];
        let engine = engine(FakeTracker::new());
        engine.cancel_token().store(true, std::sync::atomic::Ordering::Relaxed);

        let result = engine.run(&tasks, Direction::Both);

        assert!(result.pushed.is_empty());
        assert!(result.pulled.is_empty());
        assert_eq!(engine.tracker().create_issue_calls.get(), 0);
    }

    // --- direction ---------------------------------------------------------

    #[test]
    fn direction_parses_and_defaults_to_push() {
        assert_eq!("push".parse::<Direction>().unwrap(), Direction::Push);
        assert_eq!("PULL".parse::<Direction>().unwrap(), Direction::Pull);
        assert_eq!("both".parse::<Direction>().unwrap(), Direction::Both);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::Push);
        assert!(Direction::Both.includes_push());
        assert!(Direction::Both.includes_pull());
        assert!(!Direction::Push.includes_pull());
    }
}
