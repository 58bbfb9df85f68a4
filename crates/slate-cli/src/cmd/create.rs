//! `slate create` — add a task to the backlog.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::Path;

use slate_core::model::task::{Effort, Priority, Status, Task, generate_task_id};

use crate::output::{OutputMode, render_json};
use crate::store::TaskStore;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new task.
    #[arg(short, long)]
    pub title: String,

    /// Description text (markdown).
    #[arg(short, long)]
    pub description: Option<String>,

    /// Priority: critical, high, medium, low, or someday.
    #[arg(short, long, default_value = "medium")]
    pub priority: Priority,

    /// Workflow status: backlog, up_next, in_progress, review, ready_to_ship.
    #[arg(short, long, default_value = "backlog")]
    pub status: Status,

    /// Effort estimate: trivial, low, medium, high, very_high.
    #[arg(short, long)]
    pub effort: Option<Effort>,

    /// Free-form category.
    #[arg(short, long)]
    pub category: Option<String>,

    /// Acceptance criterion (repeatable).
    #[arg(long = "criterion", value_name = "TEXT")]
    pub criteria: Vec<String>,

    /// Free-form notes.
    #[arg(short, long)]
    pub notes: Option<String>,
}

pub fn run_create(args: &CreateArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut store = TaskStore::load(project_root)?;

    let now = Utc::now();
    let id = generate_task_id(&args.title, now.timestamp_nanos_opt().unwrap_or_default());

    let mut task = Task::new(id, args.title.clone(), now);
    task.description.clone_from(&args.description);
    task.priority = args.priority;
    task.status = args.status;
    task.effort = args.effort;
    task.category.clone_from(&args.category);
    task.acceptance_criteria.clone_from(&args.criteria);
    task.notes.clone_from(&args.notes);

    store.add(task.clone());
    store.save()?;
    tracing::info!(id = %task.id, "created task");

    if output.is_json() {
        render_json(&task)?;
    } else {
        println!("Created {}: {}", task.id, task.title);
    }

    Ok(())
}
