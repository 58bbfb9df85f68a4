//! `slate update` — edit fields on an existing task.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::Path;

use slate_core::model::task::{Effort, Priority, Status};

use crate::output::{OutputMode, render_json};
use crate::store::TaskStore;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Task id or unique prefix.
    pub id: String,

    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub priority: Option<Priority>,

    #[arg(short, long)]
    pub status: Option<Status>,

    #[arg(short, long)]
    pub effort: Option<Effort>,

    #[arg(short, long)]
    pub category: Option<String>,

    /// Replace the acceptance criteria (repeatable).
    #[arg(long = "criterion", value_name = "TEXT")]
    pub criteria: Vec<String>,

    #[arg(short, long)]
    pub notes: Option<String>,
}

pub fn run_update(args: &UpdateArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut store = TaskStore::load(project_root)?;

    let now = Utc::now();
    let task = store.find_mut(&args.id)?;

    if let Some(title) = &args.title {
        task.title.clone_from(title);
    }
    if let Some(description) = &args.description {
        task.description = Some(description.clone());
    }
    if let Some(priority) = args.priority {
        task.priority = priority;
    }
    if let Some(status) = args.status {
        task.status = status;
    }
    if let Some(effort) = args.effort {
        task.effort = Some(effort);
    }
    if let Some(category) = &args.category {
        task.category = Some(category.clone());
    }
    if !args.criteria.is_empty() {
        task.acceptance_criteria.clone_from(&args.criteria);
    }
    if let Some(notes) = &args.notes {
        task.notes = Some(notes.clone());
    }

    task.updated_at = now;
    task.sync.last_local_change_at = Some(now);

    let snapshot = task.clone();
    store.save()?;
    tracing::info!(id = %snapshot.id, "updated task");

    if output.is_json() {
        render_json(&snapshot)?;
    } else {
        println!("Updated {}: {}", snapshot.id, snapshot.title);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::UpdateArgs;
    use clap::Parser;
    use slate_core::model::task::Status;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: UpdateArgs,
    }

    #[test]
    fn update_args_require_only_the_id() {
        let w = Wrapper::parse_from(["test", "sl-1"]);
        assert_eq!(w.args.id, "sl-1");
        assert!(w.args.title.is_none());
        assert!(w.args.status.is_none());
    }

    #[test]
    fn update_args_parse_status_change() {
        let w = Wrapper::parse_from(["test", "sl-1", "--status", "review"]);
        assert_eq!(w.args.status, Some(Status::Review));
    }
}
