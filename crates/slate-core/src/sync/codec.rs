//! Task ⇄ issue field conversion.
//!
//! The body format is line-oriented and parsed with an explicit section
//! scanner, so the encode→decode round trip holds without leaning on any
//! regex engine's matching semantics:
//!
//! ```text
//! <!-- slate-task:sl-1a2b3c4d -->
//!
//! description…
//!
//! ## Acceptance Criteria
//!
//! - [ ] criterion
//!
//! ## Notes
//!
//! notes…
//!
//! ---
//! Priority: high | Effort: low | Category: infra
//! ```
//!
//! The marker line is the hidden task identity; it is written on every
//! encode and survives every push update by construction.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::github::Issue;
use crate::model::task::{Effort, Priority, Status, SyncStatus, Task};

/// Label that marks an issue as managed by this tool.
pub const MARKER_LABEL: &str = "slate";

const MARKER_PREFIX: &str = "<!-- slate-task:";
const MARKER_SUFFIX: &str = "-->";
const CRITERIA_HEADING: &str = "## Acceptance Criteria";
const NOTES_HEADING: &str = "## Notes";
const FOOTER_RULE: &str = "---";

/// Render the issue body for a task, marker line first.
#[must_use]
pub fn encode_issue_body(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("{MARKER_PREFIX}{} {MARKER_SUFFIX}\n", task.id));

    if let Some(description) = task
        .description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        out.push('\n');
        out.push_str(description);
        out.push('\n');
    }

    if !task.acceptance_criteria.is_empty() {
        out.push('\n');
        out.push_str(CRITERIA_HEADING);
        out.push_str("\n\n");
        for criterion in &task.acceptance_criteria {
            out.push_str(&format!("- [ ] {criterion}\n"));
        }
    }

    if let Some(notes) = task
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        out.push('\n');
        out.push_str(NOTES_HEADING);
        out.push_str("\n\n");
        out.push_str(notes);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(FOOTER_RULE);
    out.push('\n');
    out.push_str(&format!("Priority: {}", task.priority));
    if let Some(effort) = task.effort {
        out.push_str(&format!(" | Effort: {effort}"));
    }
    if let Some(category) = task.category.as_deref() {
        out.push_str(&format!(" | Category: {category}"));
    }
    out.push('\n');

    out
}

/// The label set a task's issue should carry.
///
/// The initial workflow state is the unlabeled default; every other status
/// gets an explicit label.
#[must_use]
pub fn encode_labels(task: &Task) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    labels.insert(MARKER_LABEL.to_string());
    labels.insert(format!("priority:{}", task.priority));
    if task.status != Status::Backlog {
        labels.insert(format!("status:{}", task.status.label_slug()));
    }
    if let Some(effort) = task.effort {
        labels.insert(format!("effort:{}", effort.label_slug()));
    }
    if let Some(category) = task.category.as_deref() {
        labels.insert(format!("category:{category}"));
    }
    labels
}

/// Pull the embedded task id out of an issue body, if present.
#[must_use]
pub fn extract_marker_id(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        let trimmed = line.trim();
        let rest = trimmed.strip_prefix(MARKER_PREFIX)?;
        let id = rest.strip_suffix(MARKER_SUFFIX)?.trim();
        (!id.is_empty()).then(|| id.to_string())
    })
}

/// Rebuild a task snapshot from a remote issue.
///
/// Identity resolution: embedded marker, then the known task for this
/// pairing, then a synthetic id derived from the issue number. Field enums
/// come from labels, each with its default when no label matches. A closed
/// issue forces the terminal workflow state.
#[must_use]
pub fn decode_issue(issue: &Issue, existing: Option<&Task>, now: DateTime<Utc>) -> Task {
    let body = issue.body.as_deref().unwrap_or("");
    let sections = parse_body(body);

    let id = extract_marker_id(body)
        .or_else(|| existing.map(|task| task.id.clone()))
        .unwrap_or_else(|| format!("gh-{}", issue.number));

    let mut priority = Priority::default();
    let mut status = Status::default();
    let mut effort: Option<Effort> = None;
    let mut category: Option<String> = None;

    for label in &issue.labels {
        if let Some(value) = label.name.strip_prefix("priority:") {
            if let Ok(parsed) = value.parse() {
                priority = parsed;
            }
        } else if let Some(value) = label.name.strip_prefix("status:") {
            if let Ok(parsed) = value.parse() {
                status = parsed;
            }
        } else if let Some(value) = label.name.strip_prefix("effort:") {
            if let Ok(parsed) = value.parse() {
                effort = Some(parsed);
            }
        } else if let Some(value) = label.name.strip_prefix("category:") {
            category = Some(value.to_string());
        }
    }

    if issue.state.is_closed() && !status.is_terminal() {
        status = Status::ReadyToShip;
    }

    let mut task = existing.cloned().unwrap_or_else(|| Task {
        created_at: issue.created_at,
        ..Task::default()
    });

    task.id = id;
    task.title = issue.title.clone();
    task.description = sections.description;
    task.priority = priority;
    task.status = status;
    task.effort = effort;
    task.category = category;
    task.acceptance_criteria = sections.criteria;
    task.notes = sections.notes;
    task.updated_at = issue.updated_at;
    task.sync.issue_number = Some(issue.number);
    task.sync.issue_url = Some(issue.html_url.clone());
    task.sync.last_synced_at = Some(now);
    task.sync.last_remote_change_at = Some(issue.updated_at);
    task.sync.status = SyncStatus::Synced;
    task
}

#[derive(Debug, Default)]
struct BodySections {
    description: Option<String>,
    criteria: Vec<String>,
    notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Criteria,
    Notes,
    /// An unrecognized heading or the metadata footer; content is dropped.
    Skipped,
}

fn parse_body(body: &str) -> BodySections {
    let mut section = Section::Description;
    let mut description: Vec<&str> = Vec::new();
    let mut criteria: Vec<String> = Vec::new();
    let mut notes: Vec<&str> = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with(MARKER_PREFIX) {
            continue;
        }
        if trimmed == FOOTER_RULE {
            section = Section::Skipped;
            continue;
        }
        if trimmed.starts_with("## ") {
            section = match trimmed {
                CRITERIA_HEADING => Section::Criteria,
                NOTES_HEADING => Section::Notes,
                _ => Section::Skipped,
            };
            continue;
        }

        match section {
            Section::Description => description.push(line),
            Section::Criteria => {
                // Checkbox state is ignored: membership, not completion.
                if let Some(item) = checklist_item(trimmed) {
                    criteria.push(item.to_string());
                }
            }
            Section::Notes => notes.push(line),
            Section::Skipped => {}
        }
    }

    BodySections {
        description: collect_text(&description),
        criteria,
        notes: collect_text(&notes),
    }
}

fn checklist_item(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("- [")?;
    let (state, item) = rest.split_once(']')?;
    matches!(state, " " | "x" | "X").then(|| item.trim())
}

fn collect_text(lines: &[&str]) -> Option<String> {
    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}
