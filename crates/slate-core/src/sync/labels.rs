//! Label taxonomy lifecycle.
//!
//! Before any issue references a label, the full set a batch of tasks needs
//! must exist on the remote. Creation is idempotent at the API boundary:
//! a racing creator surfaces as `AlreadyExists` and is ignored. Nothing in
//! this module fails the overall run.

use std::collections::BTreeSet;

use super::codec::{MARKER_LABEL, encode_labels};
use super::report::SyncErrorRecord;
use crate::github::{GithubError, IssueTracker, LabelCreation, LabelSpec};

const COLOR_PRIORITY_CRITICAL: &str = "b60205";
const COLOR_PRIORITY_HIGH: &str = "d93f0b";
const COLOR_PRIORITY_MEDIUM: &str = "fbca04";
const COLOR_PRIORITY_LOW: &str = "0e8a16";
const COLOR_PRIORITY_SOMEDAY: &str = "c5def5";
const COLOR_STATUS: &str = "1d76db";
const COLOR_EFFORT: &str = "5319e7";
const COLOR_MARKER: &str = "0052cc";
const COLOR_DEFAULT: &str = "ededed";

/// Outcome of one reconciliation pass over the label set.
#[derive(Debug, Default)]
pub struct LabelReport {
    /// Labels actually created by this pass.
    pub created: Vec<String>,
    /// Non-fatal failures; the run continues.
    pub errors: Vec<SyncErrorRecord>,
    /// The remote rejected the token; the caller should abort the run.
    pub auth_failed: bool,
}

/// The union of the marker label and every label any task in the batch
/// would need.
#[must_use]
pub fn required_labels(tasks: &[crate::model::task::Task]) -> BTreeSet<String> {
    let mut required = BTreeSet::new();
    required.insert(MARKER_LABEL.to_string());
    for task in tasks {
        required.extend(encode_labels(task));
    }
    required
}

/// Ensure every required label exists, creating the missing ones.
pub fn ensure_labels<T: IssueTracker + ?Sized>(
    tracker: &T,
    required: &BTreeSet<String>,
) -> LabelReport {
    let mut report = LabelReport::default();

    let existing = match tracker.list_labels() {
        Ok(labels) => labels,
        Err(err) if err.is_auth_failure() => {
            // The engine records the fatal auth error once.
            report.auth_failed = true;
            return report;
        }
        Err(err) => {
            report.errors.push(label_error("list_labels", None, &err));
            return report;
        }
    };

    let existing_lower: BTreeSet<String> = existing
        .iter()
        .map(|label| label.name.to_lowercase())
        .collect();

    for name in required {
        if existing_lower.contains(&name.to_lowercase()) {
            continue;
        }

        match tracker.create_label(&label_spec(name)) {
            Ok(LabelCreation::Created) => {
                tracing::debug!(label = %name, "created remote label");
                report.created.push(name.clone());
            }
            Ok(LabelCreation::AlreadyExists) => {}
            Err(err) if err.is_auth_failure() => {
                report.auth_failed = true;
                return report;
            }
            Err(err) => {
                report
                    .errors
                    .push(label_error("create_label", Some(name), &err));
            }
        }
    }

    report
}

fn label_error(operation: &str, label: Option<&str>, err: &GithubError) -> SyncErrorRecord {
    let message = match label {
        Some(name) => format!("label '{name}': {err}"),
        None => err.to_string(),
    };
    SyncErrorRecord {
        operation: operation.to_string(),
        task_id: None,
        issue_number: None,
        message,
        retryable: true,
    }
}

/// Color and description for a label name, fixed for the known schema and
/// generic for free-form category labels.
#[must_use]
pub fn label_spec(name: &str) -> LabelSpec {
    let (color, description) = match name {
        MARKER_LABEL => (COLOR_MARKER, "Managed by slate".to_string()),
        "priority:critical" => (COLOR_PRIORITY_CRITICAL, "Priority: critical".to_string()),
        "priority:high" => (COLOR_PRIORITY_HIGH, "Priority: high".to_string()),
        "priority:medium" => (COLOR_PRIORITY_MEDIUM, "Priority: medium".to_string()),
        "priority:low" => (COLOR_PRIORITY_LOW, "Priority: low".to_string()),
        "priority:someday" => (COLOR_PRIORITY_SOMEDAY, "Priority: someday".to_string()),
        _ if name.starts_with("status:") => {
            (COLOR_STATUS, format!("Workflow status: {}", &name[7..]))
        }
        _ if name.starts_with("effort:") => {
            (COLOR_EFFORT, format!("Estimated effort: {}", &name[7..]))
        }
        _ => (COLOR_DEFAULT, "Task category".to_string()),
    };

    LabelSpec {
        name: name.to_string(),
        color: color.to_string(),
        description,
    }
}
