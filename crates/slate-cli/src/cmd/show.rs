//! `slate show` — full detail for one task.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use crate::output::{OutputMode, render_json};
use crate::store::TaskStore;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Task id or unique prefix.
    pub id: String,
}

pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let store = TaskStore::load(project_root)?;
    let task = store.find(&args.id)?;

    if output.is_json() {
        render_json(task)?;
        return Ok(());
    }

    println!("{}  {}", task.id, task.title);
    println!("  priority:  {}", task.priority);
    println!("  status:    {}", task.status);
    if let Some(effort) = task.effort {
        println!("  effort:    {effort}");
    }
    if let Some(category) = &task.category {
        println!("  category:  {category}");
    }
    if let Some(description) = &task.description {
        println!("  description:");
        for line in description.lines() {
            println!("    {line}");
        }
    }
    if !task.acceptance_criteria.is_empty() {
        println!("  acceptance criteria:");
        for criterion in &task.acceptance_criteria {
            println!("    - {criterion}");
        }
    }
    if let Some(notes) = &task.notes {
        println!("  notes:");
        for line in notes.lines() {
            println!("    {line}");
        }
    }
    if let Some(number) = task.sync.issue_number {
        let url = task.sync.issue_url.as_deref().unwrap_or("");
        println!("  issue:     #{number} {url}");
    }
    println!("  sync:      {}", task.sync.status);

    Ok(())
}
