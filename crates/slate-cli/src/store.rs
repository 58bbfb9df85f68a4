//! File-backed task store at `.slate/tasks.json`.
//!
//! The store owns task persistence. The sync engine never touches it: a run
//! gets a snapshot of the task list and hands back a [`SyncResult`] whose
//! records are applied here in one place.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use slate_core::model::task::{SyncStatus, Task};
use slate_core::sync::SyncResult;

const SLATE_DIR: &str = ".slate";
const TASKS_FILE: &str = "tasks.json";

/// Counts of store mutations applied from one sync run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    pub updated_refs: usize,
    pub upserted: usize,
    pub flagged_conflicts: usize,
}

#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Create `.slate/` with an empty task list. Returns `false` when the
    /// store already existed.
    pub fn init(project_root: &Path) -> Result<bool> {
        let dir = project_root.join(SLATE_DIR);
        let path = dir.join(TASKS_FILE);
        if path.exists() {
            return Ok(false);
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        std::fs::write(&path, "[]\n")
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(true)
    }

    /// Load the store, failing when the project is not initialized.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(SLATE_DIR).join(TASKS_FILE);
        if !path.exists() {
            bail!("not a slate project (run `slate init` first)");
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let tasks: Vec<Task> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Self { path, tasks })
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.tasks)?;
        std::fs::write(&self.path, json + "\n")
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Resolve a task by full id or unique prefix.
    pub fn find(&self, id_or_prefix: &str) -> Result<&Task> {
        if let Some(task) = self.tasks.iter().find(|task| task.id == id_or_prefix) {
            return Ok(task);
        }

        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.id.starts_with(id_or_prefix))
            .collect();

        match matches.as_slice() {
            [] => bail!("no task matches '{id_or_prefix}'"),
            [task] => Ok(task),
            _ => bail!(
                "ambiguous task id '{id_or_prefix}' ({} matches); use a longer prefix",
                matches.len()
            ),
        }
    }

    pub fn find_mut(&mut self, id_or_prefix: &str) -> Result<&mut Task> {
        let id = self.find(id_or_prefix)?.id.clone();
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .context("task vanished between lookup and edit")
    }

    /// Persist one run's proposed mutations.
    ///
    /// Push records update remote-reference metadata, pull records upsert
    /// decoded snapshots, conflict records flag tasks for human resolution.
    /// `last_synced_at` never moves backwards.
    pub fn apply_sync(&mut self, result: &SyncResult) -> AppliedChanges {
        let mut applied = AppliedChanges::default();

        for record in &result.pushed {
            let Some(task) = self.tasks.iter_mut().find(|task| task.id == record.task_id)
            else {
                continue;
            };
            if record.issue_number.is_some() {
                task.sync.issue_number = record.issue_number;
            }
            if record.issue_url.is_some() {
                task.sync.issue_url.clone_from(&record.issue_url);
            }
            if let Some(synced_at) = record.synced_at {
                bump_synced_at(&mut task.sync.last_synced_at, synced_at);
                task.sync.status = SyncStatus::Synced;
                applied.updated_refs += 1;
            }
        }

        for record in &result.pulled {
            applied.upserted += 1;
            match self
                .tasks
                .iter_mut()
                .find(|task| task.id == record.task.id)
            {
                Some(existing) => {
                    let previous_synced = existing.sync.last_synced_at;
                    *existing = record.task.clone();
                    if let Some(previous) = previous_synced {
                        bump_synced_at(&mut existing.sync.last_synced_at, previous);
                    }
                }
                None => self.tasks.push(record.task.clone()),
            }
        }

        for record in &result.conflicts {
            if let Some(task) = self.tasks.iter_mut().find(|task| task.id == record.task_id) {
                task.sync.status = SyncStatus::Conflict;
                applied.flagged_conflicts += 1;
            }
        }

        applied
    }
}

/// Monotonic update: once set, `last_synced_at` only increases.
fn bump_synced_at(slot: &mut Option<DateTime<Utc>>, candidate: DateTime<Utc>) {
    match slot {
        Some(current) if *current >= candidate => {}
        _ => *slot = Some(candidate),
    }
}
