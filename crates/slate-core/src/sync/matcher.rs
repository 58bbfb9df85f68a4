//! Task → issue pairing resolution.
//!
//! Strategies run in a fixed order over the run's issue snapshot: explicit
//! reference number, embedded marker id, then an exact-title + marker-label
//! heuristic that re-links issues pushed by a run that never persisted its
//! references. The `claimed` set holds issue numbers already paired this
//! run, keeping the mapping injective.
//!
//! Known limitation: the title heuristic takes the first match, so two
//! distinct tasks sharing an identical title can pair with the wrong issue.

use std::collections::HashSet;

use super::codec::{MARKER_LABEL, extract_marker_id};
use crate::github::Issue;
use crate::model::task::Task;

type Strategy = fn(&Task, &[Issue], &HashSet<u64>) -> Option<usize>;

const STRATEGIES: [Strategy; 3] = [by_reference, by_marker, by_title_and_marker_label];

/// Find the issue representing `task`, if any.
#[must_use]
pub fn match_issue<'a>(
    task: &Task,
    issues: &'a [Issue],
    claimed: &HashSet<u64>,
) -> Option<&'a Issue> {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(task, issues, claimed))
        .and_then(|index| issues.get(index))
}

fn by_reference(task: &Task, issues: &[Issue], claimed: &HashSet<u64>) -> Option<usize> {
    let number = task.sync.issue_number?;
    issues
        .iter()
        .position(|issue| issue.number == number && !claimed.contains(&issue.number))
}

fn by_marker(task: &Task, issues: &[Issue], claimed: &HashSet<u64>) -> Option<usize> {
    issues.iter().position(|issue| {
        !claimed.contains(&issue.number)
            && issue
                .body
                .as_deref()
                .and_then(extract_marker_id)
                .is_some_and(|id| id == task.id)
    })
}

fn by_title_and_marker_label(
    task: &Task,
    issues: &[Issue],
    claimed: &HashSet<u64>,
) -> Option<usize> {
    issues.iter().position(|issue| {
        !claimed.contains(&issue.number)
            && issue.title == task.title
            && issue.has_label(MARKER_LABEL)
    })
}

#[cfg(test)]
mod tests {
    use super::match_issue;
    use crate::github::{Issue, IssueState, Label};
    use crate::model::task::Task;
    use chrono::Utc;
    use std::collections::HashSet;

    fn issue(number: u64, title: &str, body: Option<&str>, labels: &[&str]) -> Issue {
        Issue {
            number,
            title: title.to_string(),
            body: body.map(ToOwned::to_owned),
            state: IssueState::Open,
            labels: labels
                .iter()
                .map(|name| Label {
                    name: (*name).to_string(),
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            html_url: String::new(),
            pull_request: None,
        }
    }

    fn task(id: &str, title: &str) -> Task {
        Task::new(id, title, Utc::now())
    }

    #[test]
    fn reference_number_is_the_fast_path() {
        let issues = vec![
            issue(1, "Other title", None, &["slate"]),
            issue(2, "Fix login bug", None, &["slate"]),
        ];
        let mut t = task("sl-x", "Fix login bug");
        t.sync.issue_number = Some(1);

        let matched = match_issue(&t, &issues, &HashSet::new()).expect("should match");
        assert_eq!(matched.number, 1, "reference beats title");
    }

    #[test]
    fn marker_beats_title_match() {
        let issues = vec![
            issue(1, "Fix login bug", None, &["slate"]),
            issue(
                2,
                "Renamed on the remote",
                Some("<!-- slate-task:sl-x -->\n\nbody"),
                &["slate"],
            ),
        ];
        let t = task("sl-x", "Fix login bug");

        let matched = match_issue(&t, &issues, &HashSet::new()).expect("should match");
        assert_eq!(matched.number, 2, "marker id beats exact title");
    }

    #[test]
    fn title_fallback_requires_marker_label() {
        let issues = vec![
            issue(1, "Fix login bug", None, &["bug"]),
            issue(2, "Fix login bug", None, &["slate"]),
        ];
        let t = task("sl-x", "Fix login bug");

        let matched = match_issue(&t, &issues, &HashSet::new()).expect("should match");
        assert_eq!(matched.number, 2);
    }

    #[test]
    fn no_strategy_match_means_unpaired() {
        let issues = vec![issue(1, "Unrelated", None, &["slate"])];
        let t = task("sl-x", "Fix login bug");
        assert!(match_issue(&t, &issues, &HashSet::new()).is_none());
    }

    #[test]
    fn claimed_issues_are_invisible() {
        let issues = vec![issue(1, "Fix login bug", None, &["slate"])];
        let t = task("sl-x", "Fix login bug");

        let mut claimed = HashSet::new();
        claimed.insert(1);
        assert!(match_issue(&t, &issues, &claimed).is_none());
    }

    #[test]
    fn stale_reference_falls_through_to_marker() {
        // Reference points at an issue absent from the snapshot; the marker
        // scan still finds the right one.
        let issues = vec![issue(
            5,
            "Whatever",
            Some("<!-- slate-task:sl-x -->"),
            &["slate"],
        )];
        let mut t = task("sl-x", "Fix login bug");
        t.sync.issue_number = Some(999);

        let matched = match_issue(&t, &issues, &HashSet::new()).expect("should match");
        assert_eq!(matched.number, 5);
    }
}
