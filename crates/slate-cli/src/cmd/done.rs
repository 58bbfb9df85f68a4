//! `slate done` — move a task to the terminal workflow status.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::Path;

use slate_core::model::task::Status;

use crate::output::{OutputMode, render_json};
use crate::store::TaskStore;

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Task id or unique prefix.
    pub id: String,
}

pub fn run_done(args: &DoneArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut store = TaskStore::load(project_root)?;

    let now = Utc::now();
    let task = store.find_mut(&args.id)?;
    task.status = Status::ReadyToShip;
    task.updated_at = now;
    task.sync.last_local_change_at = Some(now);

    let snapshot = task.clone();
    store.save()?;
    tracing::info!(id = %snapshot.id, "marked task ready to ship");

    if output.is_json() {
        render_json(&snapshot)?;
    } else {
        println!("Done {}: {}", snapshot.id, snapshot.title);
    }

    Ok(())
}
