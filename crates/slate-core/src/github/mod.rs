//! GitHub wire types and the remote-tracker seam.
//!
//! Everything the reconciliation engine knows about the remote side goes
//! through [`IssueTracker`]; the production implementation is
//! [`client::GithubClient`]. Tests substitute an in-memory fake.

pub mod client;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use client::{GithubClient, GithubError};

/// `<owner>/<repo>` identifier for a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    /// Parse an `<owner>/<repo>` string.
    ///
    /// # Errors
    /// Fails when either side of the slash is missing or empty.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let trimmed = raw.trim();
        let Some((owner, repo)) = trimmed.split_once('/') else {
            anyhow::bail!("invalid repo slug '{trimmed}': expected <owner>/<repo>");
        };

        if owner.is_empty() || repo.is_empty() {
            anyhow::bail!("invalid repo slug '{trimmed}': expected <owner>/<repo>");
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Open/closed issue state as GitHub reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// An issue as returned by the list/create/update endpoints.
///
/// Read-only from the engine's perspective except for the fields it PATCHes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    /// Present on pull requests; the issues endpoint returns both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.labels
            .iter()
            .any(|label| label.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|label| label.name.as_str()).collect()
    }
}

/// Fields accepted by the create-issue endpoint. Create does not accept a
/// state; closing a fresh issue takes a follow-up update.
#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Partial update for the PATCH endpoint; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
}

/// A label to create, with its display metadata.
#[derive(Debug, Clone, Serialize)]
pub struct LabelSpec {
    pub name: String,
    pub color: String,
    pub description: String,
}

/// Outcome of a create-label call. The remote treats re-creation as a
/// validation failure; modeling it as a distinct outcome makes label
/// creation idempotent at this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCreation {
    Created,
    AlreadyExists,
}

/// The remote operations the reconciliation engine needs.
pub trait IssueTracker {
    /// List all labels in the repository (single fixed-size page).
    fn list_labels(&self) -> Result<Vec<Label>, GithubError>;

    /// Create a label, treating a validation conflict as `AlreadyExists`.
    fn create_label(&self, spec: &LabelSpec) -> Result<LabelCreation, GithubError>;

    /// List issues carrying `label`, open and closed, pull requests excluded
    /// (single fixed-size page).
    fn list_issues(&self, label: &str) -> Result<Vec<Issue>, GithubError>;

    fn create_issue(&self, new: &NewIssue) -> Result<Issue, GithubError>;

    fn update_issue(&self, number: u64, patch: &IssuePatch) -> Result<Issue, GithubError>;
}
