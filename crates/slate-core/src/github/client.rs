//! Thin blocking HTTP wrapper over the GitHub REST API.
//!
//! One authenticated entry point, uniform error surface, fixed-page listing.
//! Pacing between calls is the engine's responsibility; this layer only
//! bounds each individual request with a timeout.

use serde_json::Value as JsonValue;
use std::cell::Cell;
use std::time::Duration;

use super::{
    Issue, IssueTracker, Label, LabelCreation, LabelSpec, NewIssue, IssuePatch, RepoSlug,
};

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "slate-cli";
const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed failure from the remote API.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// Non-2xx response. Callers pattern-match on the status.
    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, DNS, or TLS failure before a response arrived.
    #[error("GitHub API transport failure: {0}")]
    Transport(String),

    /// A 2xx response whose body did not decode as expected.
    #[error("failed to decode GitHub API response: {0}")]
    Decode(String),
}

impl GithubError {
    /// True for 401 responses: invalid or expired token, aborts the run.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// True for 422 responses: validation conflict.
    #[must_use]
    pub const fn is_validation_conflict(&self) -> bool {
        matches!(self, Self::Status { status: 422, .. })
    }
}

/// Authenticated client bound to one repository.
pub struct GithubClient {
    repo: RepoSlug,
    token: String,
    base_url: String,
    agent: ureq::Agent,
    requests: Cell<usize>,
}

impl GithubClient {
    #[must_use]
    pub fn new(repo: RepoSlug, token: String) -> Self {
        Self::with_base_url(repo, token, "https://api.github.com".to_string())
    }

    /// Construction-time base URL override; no ambient configuration.
    #[must_use]
    pub fn with_base_url(repo: RepoSlug, token: String, base_url: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build();
        Self {
            repo,
            token,
            base_url,
            agent,
            requests: Cell::new(0),
        }
    }

    /// Number of HTTP requests issued so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    fn repo_path(&self, tail: &str) -> String {
        format!("/repos/{}/{}{tail}", self.repo.owner, self.repo.repo)
    }

    /// The single authenticated entry point. A No-Content response decodes
    /// to JSON null rather than erroring.
    fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&JsonValue>,
    ) -> Result<JsonValue, GithubError> {
        self.requests.set(self.requests.get() + 1);

        let url = format!("{}{path}", self.base_url);
        let request = self
            .agent
            .request(method, &url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", API_VERSION)
            .set("User-Agent", USER_AGENT);

        tracing::debug!(method, path, "github request");

        let response = match body {
            Some(json) => request.send_json(json),
            None => request.call(),
        };

        match response {
            Ok(response) if response.status() == 204 => Ok(JsonValue::Null),
            Ok(response) => response
                .into_json::<JsonValue>()
                .map_err(|err| GithubError::Decode(err.to_string())),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(GithubError::Status { status, body })
            }
            Err(err) => Err(GithubError::Transport(err.to_string())),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(value: JsonValue) -> Result<T, GithubError> {
        serde_json::from_value(value).map_err(|err| GithubError::Decode(err.to_string()))
    }
}

impl IssueTracker for GithubClient {
    fn list_labels(&self) -> Result<Vec<Label>, GithubError> {
        let path = self.repo_path(&format!("/labels?per_page={PAGE_SIZE}"));
        let value = self.request("GET", &path, None)?;
        Self::decode(value)
    }

    fn create_label(&self, spec: &LabelSpec) -> Result<LabelCreation, GithubError> {
        let path = self.repo_path("/labels");
        let body = serde_json::to_value(spec).map_err(|err| GithubError::Decode(err.to_string()))?;
        match self.request("POST", &path, Some(&body)) {
            Ok(_) => Ok(LabelCreation::Created),
            // Racing creators: the label landed between list and create.
            Err(err) if err.is_validation_conflict() => Ok(LabelCreation::AlreadyExists),
            Err(err) => Err(err),
        }
    }

    fn list_issues(&self, label: &str) -> Result<Vec<Issue>, GithubError> {
        let path = self.repo_path(&format!(
            "/issues?state=all&labels={label}&per_page={PAGE_SIZE}"
        ));
        let value = self.request("GET", &path, None)?;
        let issues: Vec<Issue> = Self::decode(value)?;
        // The issues endpoint returns pull requests too.
        Ok(issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .collect())
    }

    fn create_issue(&self, new: &NewIssue) -> Result<Issue, GithubError> {
        let path = self.repo_path("/issues");
        let body = serde_json::to_value(new).map_err(|err| GithubError::Decode(err.to_string()))?;
        let value = self.request("POST", &path, Some(&body))?;
        Self::decode(value)
    }

    fn update_issue(&self, number: u64, patch: &IssuePatch) -> Result<Issue, GithubError> {
        let path = self.repo_path(&format!("/issues/{number}"));
        let body =
            serde_json::to_value(patch).map_err(|err| GithubError::Decode(err.to_string()))?;
        let value = self.request("PATCH", &path, Some(&body))?;
        Self::decode(value)
    }
}
