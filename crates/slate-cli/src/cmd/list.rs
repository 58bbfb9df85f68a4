//! `slate list` — list backlog tasks with optional filters.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use slate_core::model::task::{Priority, Status, Task};

use crate::output::{OutputMode, render_json};
use crate::store::TaskStore;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only tasks in this workflow status.
    #[arg(short, long)]
    pub status: Option<Status>,

    /// Only tasks with this priority.
    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// Only tasks in this category.
    #[arg(short, long)]
    pub category: Option<String>,
}

pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let store = TaskStore::load(project_root)?;

    let tasks: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|task| args.status.is_none_or(|status| task.status == status))
        .filter(|task| args.priority.is_none_or(|priority| task.priority == priority))
        .filter(|task| {
            args.category
                .as_deref()
                .is_none_or(|category| task.category.as_deref() == Some(category))
        })
        .collect();

    if output.is_json() {
        render_json(&tasks)?;
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks match.");
        return Ok(());
    }

    for task in tasks {
        let issue = task
            .sync
            .issue_number
            .map(|number| format!(" #{number}"))
            .unwrap_or_default();
        println!(
            "{:<14} {:<9} {:<13} {}{issue}",
            task.id, task.priority, task.status, task.title
        );
    }

    Ok(())
}
