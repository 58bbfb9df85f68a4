use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The five priority bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Someday,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Someday => "someday",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Workflow states, ordered from intake to shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Backlog,
    UpNext,
    InProgress,
    Review,
    ReadyToShip,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::UpNext => "up_next",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::ReadyToShip => "ready_to_ship",
        }
    }

    /// Label-safe form: underscores become dashes.
    pub const fn label_slug(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::UpNext => "up-next",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::ReadyToShip => "ready-to-ship",
        }
    }

    /// The terminal workflow state. A task here maps to a closed issue.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ReadyToShip)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Backlog
    }
}

/// Optional effort sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Trivial,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Effort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trivial => "trivial",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }

    /// Label-safe form: underscores become dashes.
    pub const fn label_slug(self) -> &'static str {
        match self {
            Self::Trivial => "trivial",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }
}

/// Where a task stands relative to its remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Unsynced,
    Synced,
    Conflict,
}

impl SyncStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsynced => "unsynced",
            Self::Synced => "synced",
            Self::Conflict => "conflict",
        }
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::Unsynced
    }
}

/// Remote-tracker bookkeeping carried on every task.
///
/// Owned by the storage layer; the sync engine only reads these fields and
/// proposes new values through its result records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncMeta {
    pub issue_number: Option<u64>,
    pub issue_url: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_local_change_at: Option<DateTime<Utc>>,
    pub last_remote_change_at: Option<DateTime<Utc>>,
    pub status: SyncStatus,
}

/// A backlog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub effort: Option<Effort>,
    pub category: Option<String>,
    pub acceptance_criteria: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync: SyncMeta,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: None,
            priority: Priority::default(),
            status: Status::default(),
            effort: None,
            category: None,
            acceptance_criteria: Vec::new(),
            notes: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            sync: SyncMeta::default(),
        }
    }
}

impl Task {
    /// Create an empty task with the given identity and creation time.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    /// The moment of the most recent local edit.
    ///
    /// `last_local_change_at` is stamped by explicit edits; `updated_at`
    /// catches mutations that bypassed it. The later of the two wins.
    #[must_use]
    pub fn local_modified_at(&self) -> DateTime<Utc> {
        match self.sync.last_local_change_at {
            Some(changed) => changed.max(self.updated_at),
            None => self.updated_at,
        }
    }
}

/// Deterministic short task id derived from title and creation instant.
///
/// Same recipe as remote-import ids: digest, keep a short prefix. Two tasks
/// created in the same nanosecond with the same title collide; acceptable
/// for a single-writer store.
#[must_use]
pub fn generate_task_id(title: &str, created_ns: i64) -> String {
    let seed = format!("{title}:{created_ns}");
    let digest = blake3::hash(seed.as_bytes()).to_hex().to_string();
    let short = digest.get(..8).unwrap_or(&digest);
    format!("sl-{short}")
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "someday" => Ok(Self::Someday),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "backlog" => Ok(Self::Backlog),
            "up_next" => Ok(Self::UpNext),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "ready_to_ship" => Ok(Self::ReadyToShip),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Effort {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "trivial" => Ok(Self::Trivial),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very_high" => Ok(Self::VeryHigh),
            _ => Err(ParseEnumError {
                expected: "effort",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for SyncStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "unsynced" => Ok(Self::Unsynced),
            "synced" => Ok(Self::Synced),
            "conflict" => Ok(Self::Conflict),
            _ => Err(ParseEnumError {
                expected: "sync status",
                got: s.to_string(),
            }),
        }
    }
}
